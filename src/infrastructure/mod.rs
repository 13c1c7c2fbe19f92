pub mod credential;
pub mod http_executor;

pub use credential::{Credential, CredentialProvider, ReauthRequired, StaticCredentialProvider};
pub use http_executor::HttpExecutor;
