//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (宿主：按计划驱动一次会话)
//!     ↓
//! workflow::ComposeSession (一次编辑会话的状态机)
//!     ↓
//! services (能力层：浏览 / 勾选 / 校验 / 加载 / 提交)
//!     ↓
//! clients (线路格式：REST 存储客户端)
//!     ↓
//! infrastructure (基础设施：HttpExecutor、凭证)
//! ```

pub mod app;

pub use app::App;
