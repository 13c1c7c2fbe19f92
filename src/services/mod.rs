pub mod assignment_loader;
pub mod catalog_browser;
pub mod commit;
pub mod selection;
pub mod validator;

pub use assignment_loader::AssignmentLoader;
pub use catalog_browser::{fetch_page, CatalogBrowser, QueryOutcome, QueryTicket, RequestToken};
pub use commit::{CommitCoordinator, CommitDelta, CommitPermit, CommitReceipt};
pub use selection::{SelectionEvent, SelectionSet};
pub use validator::ComposeValidator;
