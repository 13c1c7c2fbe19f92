pub mod composition;
pub mod filter;
pub mod loaders;
pub mod plan;
pub mod question;

pub use composition::{AssignmentSnapshot, CompositionSpec, TierCounts};
pub use filter::{CatalogFilter, CatalogQuery};
pub use loaders::load_composition_plan;
pub use plan::CompositionPlan;
pub use question::{CandidateItem, CatalogPage, QuestionType, SelectionEntry, Tier};
