pub mod compose_session;
pub mod session_ctx;

pub use compose_session::{
    CatalogFetcher, CloseReason, Collaborators, CommitOutcome, ComposeSession, EditorState,
    PendingCommit, SessionEvent,
};
pub use session_ctx::SessionCtx;
