//! 错误类型
//!
//! 分两层：
//! - `ApiError`：线路层错误，由 `HttpExecutor` 和存储客户端产生
//! - `ComposeError`：组卷会话能看到的错误分类，状态机只对它做模式匹配

use std::fmt;

use thiserror::Error;

use crate::models::question::Tier;

// ========== 线路层错误 ==========

/// API 调用错误
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 网络请求失败（连接失败、超时、5xx 重试耗尽）
    #[error("API请求失败 ({endpoint}): {message}")]
    RequestFailed { endpoint: String, message: String },

    /// 凭证无效或已过期（401 / 403）
    #[error("API鉴权失败 ({endpoint})")]
    Unauthorized { endpoint: String },

    /// 资源不存在（404）
    #[error("API资源不存在: {endpoint}")]
    NotFound { endpoint: String },

    /// 请求频率限制，重试耗尽
    #[error("API请求频率限制 ({endpoint}), 建议等待: {retry_after:?}秒")]
    RateLimited {
        endpoint: String,
        retry_after: Option<u64>,
    },

    /// API 返回其他错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },

    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {message}")]
    JsonParseFailed { endpoint: String, message: String },
}

impl ApiError {
    /// 是否值得在线路层重试
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RequestFailed { .. } | ApiError::RateLimited { .. } => true,
            ApiError::BadResponse { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ========== 组卷错误分类 ==========

/// 发起 I/O 的操作，用于错误上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CatalogQuery,
    AssignmentLoad,
    Commit,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CatalogQuery => "题库查询",
            Operation::AssignmentLoad => "加载已选题目",
            Operation::Commit => "提交组卷",
        };
        f.write_str(name)
    }
}

/// 单条校验违规
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// 题目总数不符
    Total { expected: u32, actual: u32 },
    /// 某一难度的题目数不符
    Tier { tier: Tier, expected: u32, actual: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Total { expected, actual } => {
                write!(f, "题目总数应为 {}，当前已选 {}", expected, actual)
            }
            Violation::Tier {
                tier,
                expected,
                actual,
            } => {
                write!(f, "{}题应为 {} 道，当前已选 {} 道", tier, expected, actual)
            }
        }
    }
}

/// 一次校验得到的全部违规
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        f.write_str(&parts.join("；"))
    }
}

/// 组卷规格本身不合法
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("题目总数不能为 0")]
    ZeroTotal,
    #[error("各难度题数之和 {sum} 与总数 {total} 不一致")]
    TierSumMismatch { total: u32, sum: u64 },
    #[error("缺少所属课程ID")]
    MissingCollection,
    #[error("缺少试卷ID")]
    MissingComposition,
}

/// 面向宿主的错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Auth,
    NotFound,
    Spec,
    Busy,
    InvalidState,
}

/// 组卷会话错误
#[derive(Debug, Clone, Error)]
pub enum ComposeError {
    /// 已选题目不满足组卷规格
    #[error("校验未通过: {0}")]
    Validation(ValidationReport),

    /// 网络或存储失败，可重试
    #[error("{operation}失败: {message}")]
    Transport { operation: Operation, message: String },

    /// 需要重新登录
    #[error("{operation}需要重新登录")]
    Auth { operation: Operation },

    /// 试卷或课程已不存在
    #[error("资源不存在: {what}")]
    NotFound { what: String },

    /// 组卷规格不合法
    #[error("组卷规格错误: {0}")]
    Spec(#[from] SpecError),

    /// 同一试卷已有提交在进行中
    #[error("试卷 {composition_id} 正在提交中")]
    CommitInProgress { composition_id: String },

    /// 当前状态下不允许该操作
    #[error("当前状态 {state} 不允许执行 {operation}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl ComposeError {
    /// 在发起调用的组件处把线路层错误转换为组卷错误
    pub fn from_api(operation: Operation, err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => ComposeError::Auth { operation },
            ApiError::NotFound { endpoint } => ComposeError::NotFound { what: endpoint },
            other => ComposeError::Transport {
                operation,
                message: other.to_string(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ComposeError::Validation(_) => ErrorKind::Validation,
            ComposeError::Transport { .. } => ErrorKind::Transport,
            ComposeError::Auth { .. } => ErrorKind::Auth,
            ComposeError::NotFound { .. } => ErrorKind::NotFound,
            ComposeError::Spec(_) => ErrorKind::Spec,
            ComposeError::CommitInProgress { .. } => ErrorKind::Busy,
            ComposeError::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// 操作员可以原样重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ComposeError::Transport { .. } | ComposeError::CommitInProgress { .. }
        )
    }

    /// 该错误会结束编辑会话
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            ComposeError::Auth { .. } | ComposeError::NotFound { .. } | ComposeError::Spec(_)
        )
    }
}

// ========== Result 类型别名 ==========

pub type ApiResult<T> = Result<T, ApiError>;

/// 组卷结果类型
pub type ComposeResult<T> = Result<T, ComposeError>;
