//! 组卷编辑会话 - 流程层
//!
//! 核心职责：定义"一次打开编辑器到关闭"的完整流程
//!
//! 状态流转：
//! ```text
//! Closed → Loading → Browsing ⇄ (筛选 / 翻页 / 勾选)
//!                       ↓ submit
//!                   Validating → Browsing（附带违规）
//!                       ↓
//!                   Committing → Closed（成功）
//!                              → Browsing（附带可重试错误，选题完整保留）
//! ```
//!
//! 会话独占已选题目集合；已选快照只在打开时读取一次。
//! 会话关闭后，仍在进行的提交不会被取消，但其结果不再改变会话状态

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::clients::{AssignmentStore, CatalogStore};
use crate::error::{ComposeError, ComposeResult, ErrorKind, Violation};
use crate::infrastructure::CredentialProvider;
use crate::models::{
    AssignmentSnapshot, CandidateItem, CatalogFilter, CatalogPage, CatalogQuery, CompositionSpec,
    QuestionType, Tier,
};
use crate::services::{
    fetch_page, AssignmentLoader, CatalogBrowser, CommitCoordinator, CommitPermit, CommitReceipt,
    ComposeValidator, QueryOutcome, QueryTicket, RequestToken, SelectionEvent, SelectionSet,
};
use crate::utils::logging::log_commit_summary;
use crate::workflow::session_ctx::SessionCtx;

/// 编辑器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Loading,
    Browsing,
    Validating,
    Committing,
}

impl EditorState {
    pub fn as_str(self) -> &'static str {
        match self {
            EditorState::Closed => "Closed",
            EditorState::Loading => "Loading",
            EditorState::Browsing => "Browsing",
            EditorState::Validating => "Validating",
            EditorState::Committing => "Committing",
        }
    }
}

/// 会话关闭原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Success,
    Cancelled,
}

/// 发给宿主页面的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Closed(CloseReason),
    Error { kind: ErrorKind, message: String },
}

/// 会话依赖的外部协作者
///
/// 提交协调器在这里创建一次，让同一试卷的单飞限制跨会话生效
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub coordinator: CommitCoordinator,
}

impl Collaborators {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        assignments: Arc<dyn AssignmentStore>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let coordinator = CommitCoordinator::new(Arc::clone(&assignments), Arc::clone(&credentials));
        Self {
            catalog,
            assignments,
            credentials,
            coordinator,
        }
    }
}

/// 不借用会话的题库查询能力，用于并发发出查询
#[derive(Clone)]
pub struct CatalogFetcher {
    store: Arc<dyn CatalogStore>,
    credentials: Arc<dyn CredentialProvider>,
}

impl CatalogFetcher {
    pub async fn fetch(&self, query: &CatalogQuery) -> ComposeResult<CatalogPage> {
        fetch_page(self.store.as_ref(), self.credentials.as_ref(), query).await
    }
}

/// 已通过校验、等待执行的提交
///
/// 不借用会话：会话可以在提交进行中被关闭
pub struct PendingCommit {
    epoch: u64,
    coordinator: CommitCoordinator,
    permit: CommitPermit,
    selection: SelectionSet,
    snapshot: AssignmentSnapshot,
}

impl PendingCommit {
    /// 执行提交，许可在返回时释放
    pub async fn run(self) -> CommitOutcome {
        let result = self
            .coordinator
            .commit_with(&self.permit, &self.selection, &self.snapshot)
            .await;
        CommitOutcome {
            epoch: self.epoch,
            result,
        }
    }
}

/// 提交执行结果，交回会话处理
#[derive(Debug)]
pub struct CommitOutcome {
    epoch: u64,
    pub result: ComposeResult<CommitReceipt>,
}

/// 组卷编辑会话
pub struct ComposeSession {
    ctx: SessionCtx,
    spec: CompositionSpec,
    catalog: Arc<dyn CatalogStore>,
    credentials: Arc<dyn CredentialProvider>,
    loader: AssignmentLoader,
    coordinator: CommitCoordinator,
    state: EditorState,
    /// 每次关闭加一，用来识别关闭前发出的提交
    epoch: u64,
    selection: SelectionSet,
    snapshot: Option<AssignmentSnapshot>,
    browser: CatalogBrowser,
    violations: Vec<Violation>,
    last_error: Option<ComposeError>,
    events: UnboundedSender<SessionEvent>,
}

impl ComposeSession {
    /// 创建会话，返回会话和宿主用来接收事件的通道
    pub fn new(
        collaborators: &Collaborators,
        spec: CompositionSpec,
        page_size: u32,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            ctx: SessionCtx::from(&spec),
            browser: CatalogBrowser::new(&spec, page_size),
            spec,
            catalog: Arc::clone(&collaborators.catalog),
            credentials: Arc::clone(&collaborators.credentials),
            loader: AssignmentLoader::new(
                Arc::clone(&collaborators.assignments),
                Arc::clone(&collaborators.credentials),
            ),
            coordinator: collaborators.coordinator.clone(),
            state: EditorState::Closed,
            epoch: 0,
            selection: SelectionSet::new(),
            snapshot: None,
            violations: Vec::new(),
            last_error: None,
            events: tx,
        };
        (session, rx)
    }

    // ========== 打开 / 关闭 ==========

    /// 打开编辑器：检查规格，读取已选题目并初始化选题集合
    ///
    /// 每个会话只能打开一次；失败时会话直接关闭
    pub async fn open(&mut self) -> ComposeResult<()> {
        if self.state != EditorState::Closed || self.epoch > 0 {
            return Err(self.invalid("打开编辑器"));
        }

        self.state = EditorState::Loading;
        info!("{} 📂 打开组卷编辑器", self.ctx);

        if let Err(e) = self.spec.check() {
            return Err(self.fail_closed(ComposeError::Spec(e)));
        }

        let snapshot = match self.loader.load(&self.spec.composition_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.fail_closed(e)),
        };

        if let Err(e) = self.selection.seed(&snapshot) {
            return Err(self.fail_closed(e));
        }
        self.snapshot = Some(snapshot);
        self.state = EditorState::Browsing;

        info!(
            "{} ✓ 编辑器就绪，已选 {} / {} 题",
            self.ctx,
            self.selection.size(),
            self.spec.total
        );
        Ok(())
    }

    /// 取消编辑，丢弃选题
    pub fn cancel(&mut self) {
        if self.state == EditorState::Closed {
            return;
        }
        if self.state == EditorState::Committing {
            warn!("{} 提交进行中被取消，其结果将被忽略", self.ctx);
        }
        self.selection.apply(SelectionEvent::Clear);
        self.close();
        info!("{} 已取消编辑", self.ctx);
        self.emit(SessionEvent::Closed(CloseReason::Cancelled));
    }

    fn close(&mut self) {
        self.state = EditorState::Closed;
        self.epoch += 1;
    }

    /// 会话级致命错误：关闭并通知宿主
    fn fail_closed(&mut self, err: ComposeError) -> ComposeError {
        error!("{} ❌ {}，编辑器关闭", self.ctx, err);
        self.close();
        self.report(&err);
        self.last_error = Some(err.clone());
        err
    }

    // ========== 浏览 ==========

    pub fn set_filter(&mut self, filter: CatalogFilter) -> ComposeResult<()> {
        self.ensure_browsing("修改筛选条件")?;
        self.browser.set_filter(filter)
    }

    pub fn set_text(&mut self, text: Option<String>) -> ComposeResult<()> {
        self.ensure_browsing("修改筛选条件")?;
        self.browser.set_text(text);
        Ok(())
    }

    pub fn set_tier(&mut self, tier: Option<Tier>) -> ComposeResult<()> {
        self.ensure_browsing("修改筛选条件")?;
        self.browser.set_tier(tier);
        Ok(())
    }

    pub fn set_type(&mut self, question_type: Option<QuestionType>) -> ComposeResult<()> {
        self.ensure_browsing("修改筛选条件")?;
        self.browser.set_type(question_type)
    }

    pub fn set_page(&mut self, page: u32) -> ComposeResult<()> {
        self.ensure_browsing("翻页")?;
        self.browser.set_page(page);
        Ok(())
    }

    pub fn set_page_size(&mut self, page_size: u32) -> ComposeResult<()> {
        self.ensure_browsing("修改每页条数")?;
        self.browser.set_page_size(page_size);
        Ok(())
    }

    /// 按当前筛选和分页发出查询
    pub fn begin_query(&mut self) -> ComposeResult<QueryTicket> {
        self.ensure_browsing("查询题库")?;
        Ok(self.browser.begin_query())
    }

    pub fn catalog_fetcher(&self) -> CatalogFetcher {
        CatalogFetcher {
            store: Arc::clone(&self.catalog),
            credentials: Arc::clone(&self.credentials),
        }
    }

    /// 处理查询响应
    ///
    /// 会话已关闭时直接忽略；鉴权失败或课程不存在会关闭会话
    pub fn apply_page(
        &mut self,
        token: RequestToken,
        result: ComposeResult<CatalogPage>,
    ) -> QueryOutcome {
        if self.state == EditorState::Closed {
            debug!("{} 会话已关闭，忽略题库响应 #{}", self.ctx, token);
            return QueryOutcome::Stale;
        }

        let outcome = self.browser.complete(token, result);
        if let QueryOutcome::Failed(e) = &outcome {
            if e.ends_session() {
                self.fail_closed(e.clone());
            } else {
                self.report(e);
                self.last_error = Some(e.clone());
            }
        }
        outcome
    }

    /// 查询当前页并显示
    pub async fn refresh(&mut self) -> ComposeResult<QueryOutcome> {
        let ticket = self.begin_query()?;
        let result = self.catalog_fetcher().fetch(&ticket.query).await;
        Ok(self.apply_page(ticket.token, result))
    }

    // ========== 勾选 ==========

    /// 勾选事件的唯一入口
    ///
    /// 不属于本课程或题型不允许的题目不会被加入
    pub fn dispatch(&mut self, event: SelectionEvent) -> ComposeResult<usize> {
        self.ensure_browsing("勾选题目")?;

        let event = match event {
            SelectionEvent::Toggle { item, selected } => {
                if selected && !self.accepts(&item) {
                    return Ok(0);
                }
                SelectionEvent::Toggle { item, selected }
            }
            SelectionEvent::BulkToggle { items, selected } => {
                let items = if selected {
                    items.into_iter().filter(|item| self.accepts(item)).collect()
                } else {
                    items
                };
                SelectionEvent::BulkToggle { items, selected }
            }
            other => other,
        };

        let changed = self.selection.apply(event);
        debug!(
            "{} 勾选变化 {} 题，当前已选 {} 题",
            self.ctx,
            changed,
            self.selection.size()
        );
        Ok(changed)
    }

    pub fn toggle(&mut self, item: &CandidateItem, selected: bool) -> ComposeResult<bool> {
        let changed = self.dispatch(SelectionEvent::Toggle {
            item: item.clone(),
            selected,
        })?;
        Ok(changed > 0)
    }

    pub fn bulk_toggle(&mut self, items: &[CandidateItem], selected: bool) -> ComposeResult<usize> {
        self.dispatch(SelectionEvent::BulkToggle {
            items: items.to_vec(),
            selected,
        })
    }

    /// 对当前显示的整页勾选 / 取消
    pub fn toggle_visible(&mut self, selected: bool) -> ComposeResult<usize> {
        let items = self.browser.items().to_vec();
        self.dispatch(SelectionEvent::BulkToggle { items, selected })
    }

    fn accepts(&self, item: &CandidateItem) -> bool {
        if item.collection_id != self.spec.collection_id {
            warn!(
                "{} 题目 {} 属于课程 {}，不能加入",
                self.ctx, item.id, item.collection_id
            );
            return false;
        }
        if !self.spec.allows(item.question_type) {
            warn!(
                "{} 题目 {} 的题型 {} 不在允许范围内",
                self.ctx, item.id, item.question_type
            );
            return false;
        }
        true
    }

    // ========== 提交 ==========

    /// 校验并提交，成功后会话关闭
    pub async fn submit(&mut self) -> ComposeResult<CommitReceipt> {
        let pending = self.begin_commit()?;
        let outcome = pending.run().await;
        self.finish_commit(outcome)
    }

    /// 校验选题，通过后占用提交许可进入 Committing
    ///
    /// 校验失败或已有提交在进行时回到 Browsing，选题不变
    pub fn begin_commit(&mut self) -> ComposeResult<PendingCommit> {
        self.ensure_browsing("提交")?;
        self.state = EditorState::Validating;

        if let Err(report) = ComposeValidator::validate(&self.selection, &self.spec) {
            warn!("{} ⚠️ 校验未通过: {}", self.ctx, report);
            self.violations = report.violations.clone();
            self.state = EditorState::Browsing;
            let err = ComposeError::Validation(report);
            self.report(&err);
            return Err(err);
        }
        self.violations.clear();

        let permit = match self.coordinator.try_begin(&self.spec.composition_id) {
            Ok(permit) => permit,
            Err(e) => {
                self.state = EditorState::Browsing;
                self.report(&e);
                return Err(e);
            }
        };

        let snapshot = match self.snapshot.clone() {
            Some(snapshot) => snapshot,
            None => {
                self.state = EditorState::Browsing;
                return Err(self.invalid("提交"));
            }
        };

        self.state = EditorState::Committing;
        Ok(PendingCommit {
            epoch: self.epoch,
            coordinator: self.coordinator.clone(),
            permit,
            selection: self.selection.clone(),
            snapshot,
        })
    }

    /// 处理提交结果
    ///
    /// 会话在提交期间已关闭时只记录日志，不改变任何状态
    pub fn finish_commit(&mut self, outcome: CommitOutcome) -> ComposeResult<CommitReceipt> {
        if outcome.epoch != self.epoch || self.state != EditorState::Committing {
            info!(
                "{} 会话已关闭，忽略提交结果 (成功: {})",
                self.ctx,
                outcome.result.is_ok()
            );
            return Err(self.invalid("处理提交结果"));
        }

        match outcome.result {
            Ok(receipt) => {
                log_commit_summary(&receipt);
                self.selection.apply(SelectionEvent::Clear);
                self.last_error = None;
                self.close();
                self.emit(SessionEvent::Closed(CloseReason::Success));
                Ok(receipt)
            }
            Err(e) if e.ends_session() => Err(self.fail_closed(e)),
            Err(e) => {
                warn!("{} ⚠️ 提交失败，选题已保留，可重试: {}", self.ctx, e);
                self.state = EditorState::Browsing;
                self.last_error = Some(e.clone());
                self.report(&e);
                Err(e)
            }
        }
    }

    // ========== 辅助方法 ==========

    fn ensure_browsing(&self, operation: &'static str) -> ComposeResult<()> {
        if self.state == EditorState::Browsing {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> ComposeError {
        ComposeError::InvalidState {
            operation,
            state: self.state.as_str(),
        }
    }

    fn report(&self, err: &ComposeError) {
        self.emit(SessionEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // 宿主可能已经不再监听
        let _ = self.events.send(event);
    }

    // ========== 只读访问 ==========

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    pub fn spec(&self) -> &CompositionSpec {
        &self.spec
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn snapshot(&self) -> Option<&AssignmentSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn browser(&self) -> &CatalogBrowser {
        &self.browser
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn last_error(&self) -> Option<&ComposeError> {
        self.last_error.as_ref()
    }
}
