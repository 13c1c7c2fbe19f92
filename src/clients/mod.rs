pub mod store;
pub mod store_client;

pub use store::{AssignmentStore, AssignmentWrite, CatalogStore};
pub use store_client::StoreClient;
