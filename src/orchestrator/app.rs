//! 无界面宿主 - 编排层
//!
//! ## 职责
//!
//! 扮演"试卷管理页面"：组装协作者，按选题计划驱动一次编辑会话，输出结果。
//!
//! ## 流程
//!
//! 1. 加载 TOML 选题计划
//! 2. 打开编辑会话（读取已选题目）
//! 3. 按计划移除题目，再逐页浏览题库勾选计划中的题目
//! 4. 提交；校验未通过时列出全部违规并取消会话
//! 5. 汇总会话事件

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use crate::clients::StoreClient;
use crate::config::Config;
use crate::error::ComposeError;
use crate::infrastructure::{HttpExecutor, StaticCredentialProvider};
use crate::models::{load_composition_plan, CompositionPlan};
use crate::services::{QueryOutcome, SelectionEvent};
use crate::utils::logging::{log_spec, log_startup};
use crate::workflow::{Collaborators, ComposeSession, SessionEvent};

/// 应用主结构
pub struct App {
    config: Config,
    collaborators: Collaborators,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.api_base_url);

        let http = HttpExecutor::new(&config).context("无法创建 HTTP 客户端")?;
        let store = Arc::new(StoreClient::new(http));
        let credentials = Arc::new(StaticCredentialProvider::new(config.api_token.clone()));

        Ok(Self::with_collaborators(
            config,
            Collaborators::new(store.clone(), store, credentials),
        ))
    }

    /// 使用给定协作者创建应用
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// 运行应用主逻辑，返回是否提交成功
    pub async fn run(&self) -> Result<bool> {
        let plan = load_composition_plan(Path::new(&self.config.plan_file)).await?;
        self.run_plan(plan).await
    }

    /// 按计划完成一次组卷
    pub async fn run_plan(&self, plan: CompositionPlan) -> Result<bool> {
        log_spec(&plan.spec);

        let (mut session, mut events) =
            ComposeSession::new(&self.collaborators, plan.spec.clone(), self.config.page_size);

        if let Err(e) = session.open().await {
            drain_events(&mut events);
            return Err(e).context("无法打开组卷编辑器");
        }

        let result = self.compose(&mut session, &plan).await;
        let committed = match result {
            Ok(committed) => committed,
            Err(e) => {
                session.cancel();
                drain_events(&mut events);
                return Err(e);
            }
        };

        drain_events(&mut events);
        Ok(committed)
    }

    async fn compose(&self, session: &mut ComposeSession, plan: &CompositionPlan) -> Result<bool> {
        if !plan.deselect.is_empty() {
            let removed = session.dispatch(SelectionEvent::Remove {
                ids: plan.deselect.clone(),
            })?;
            info!("➖ 按计划移除 {} 道题目", removed);
        }

        let mut remaining: BTreeSet<String> = plan
            .select
            .iter()
            .filter(|id| !session.selection().contains(id))
            .cloned()
            .collect();

        session.set_filter(plan.filter.clone())?;

        while !remaining.is_empty() {
            match session.refresh().await? {
                QueryOutcome::Applied => {}
                QueryOutcome::Failed(e) => return Err(e).context("题库查询失败"),
                QueryOutcome::Stale => continue,
            }

            let wanted: Vec<_> = session
                .browser()
                .items()
                .iter()
                .filter(|item| remaining.contains(&item.id))
                .cloned()
                .collect();
            for item in &wanted {
                remaining.remove(&item.id);
            }
            if !wanted.is_empty() {
                let added = session.bulk_toggle(&wanted, true)?;
                info!(
                    "第 {} 页勾选 {} 道题目，已选 {} 题",
                    session.browser().page() + 1,
                    added,
                    session.selection().size()
                );
            }

            let next = session.browser().page() + 1;
            if next >= session.browser().total_pages() {
                break;
            }
            session.set_page(next)?;
        }

        if !remaining.is_empty() {
            warn!("⚠️ 题库中没有找到以下题目: {:?}", remaining);
        }

        match session.submit().await {
            Ok(_) => Ok(true),
            Err(ComposeError::Validation(report)) => {
                for violation in &report.violations {
                    warn!("❌ {}", violation);
                }
                session.cancel();
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// 输出会话发给宿主的事件
fn drain_events(events: &mut UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Closed(reason) => info!("会话关闭: {:?}", reason),
            SessionEvent::Error { kind, message } => error!("会话错误 [{:?}]: {}", kind, message),
        }
    }
}
