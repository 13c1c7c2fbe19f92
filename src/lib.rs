//! # Test Composer
//!
//! 在线学习平台管理后台的组卷引擎：为试卷挂载固定数量、按难度分层的题目
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `HttpExecutor` - 唯一的 HTTP 客户端持有者，负责重试和状态码翻译
//! - `CredentialProvider` - 每次出站调用前提供凭证
//!
//! ### ② 客户端层（Clients）
//! - `CatalogStore` / `AssignmentStore` - 存储接口
//! - `StoreClient` - 管理后台 REST 实现
//!
//! ### ③ 业务能力层（Services）
//! - `CatalogBrowser` - 筛选、分页、请求令牌
//! - `SelectionSet` - 与视图无关的已选集合
//! - `ComposeValidator` - 数量约束校验
//! - `AssignmentLoader` / `CommitCoordinator` - 读取基线、提交差量
//!
//! ### ④ 流程层（Workflow）
//! - `ComposeSession` - 编辑会话状态机
//!
//! ### ⑤ 编排层（Orchestration）
//! - `App` - 无界面宿主

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ComposeError, ComposeResult, Violation};
pub use models::{CandidateItem, CompositionSpec, Tier};
pub use orchestrator::App;
pub use services::{CatalogBrowser, ComposeValidator, SelectionSet};
pub use workflow::{ComposeSession, SessionEvent};
