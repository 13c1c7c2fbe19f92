//! 凭证能力 - 基础设施层
//!
//! 会话刷新不在本系统内，这里只消费"给我一个可用凭证，或告诉我需要重新登录"

use futures::future::{self, BoxFuture};
use thiserror::Error;

/// 访问凭证
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// 需要重新登录
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("凭证失效，需要重新登录")]
pub struct ReauthRequired;

/// 凭证提供者
///
/// 每次出站调用前都要取一次凭证
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> BoxFuture<'_, Result<Credential, ReauthRequired>>;
}

/// 使用固定令牌的凭证提供者，令牌为空时视为需要登录
pub struct StaticCredentialProvider {
    token: String,
}

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credential(&self) -> BoxFuture<'_, Result<Credential, ReauthRequired>> {
        let result = if self.token.trim().is_empty() {
            Err(ReauthRequired)
        } else {
            Ok(Credential::bearer(self.token.clone()))
        };
        Box::pin(future::ready(result))
    }
}
