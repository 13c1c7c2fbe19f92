//! 题库浏览 - 业务能力层
//!
//! 维护筛选条件和分页状态，为每次查询发放递增的请求令牌。
//! 响应按请求发出的顺序生效：只有最新令牌的响应会被显示，旧响应直接丢弃。
//! 不修改已选题目集合

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::clients::CatalogStore;
use crate::error::{ComposeError, ComposeResult, Operation};
use crate::infrastructure::CredentialProvider;
use crate::models::{
    CandidateItem, CatalogFilter, CatalogPage, CatalogQuery, CompositionSpec, QuestionType, Tier,
};

/// 请求令牌，单调递增
pub type RequestToken = u64;

/// 一次已发出的查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub token: RequestToken,
    pub query: CatalogQuery,
}

/// 响应处理结果
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// 已显示
    Applied,
    /// 已有更新的请求，本响应被丢弃
    Stale,
    /// 查询失败，上一页结果保持显示
    Failed(ComposeError),
}

/// 题库浏览器
pub struct CatalogBrowser {
    collection_id: String,
    allowed_types: BTreeSet<QuestionType>,
    filter: CatalogFilter,
    page: u32,
    page_size: u32,
    latest_token: RequestToken,
    settled_token: RequestToken,
    displayed: CatalogPage,
    last_error: Option<ComposeError>,
}

impl CatalogBrowser {
    /// 为一次编辑会话创建浏览器，所属课程在会话内固定
    pub fn new(spec: &CompositionSpec, page_size: u32) -> Self {
        Self {
            collection_id: spec.collection_id.clone(),
            allowed_types: spec.allowed_types.clone(),
            filter: CatalogFilter::default(),
            page: 0,
            page_size: page_size.max(1),
            latest_token: 0,
            settled_token: 0,
            displayed: CatalogPage::default(),
            last_error: None,
        }
    }

    // ========== 筛选与分页 ==========

    /// 整体替换筛选条件，条件变化时回到第一页
    pub fn set_filter(&mut self, filter: CatalogFilter) -> ComposeResult<()> {
        if let Some(question_type) = filter.question_type {
            self.check_type(question_type)?;
        }
        if filter != self.filter {
            self.filter = filter;
            self.page = 0;
        }
        Ok(())
    }

    pub fn set_text(&mut self, text: Option<String>) {
        let text = text.filter(|t| !t.trim().is_empty());
        if text != self.filter.text {
            self.filter.text = text;
            self.page = 0;
        }
    }

    pub fn set_tier(&mut self, tier: Option<Tier>) {
        if tier != self.filter.tier {
            self.filter.tier = tier;
            self.page = 0;
        }
    }

    pub fn set_type(&mut self, question_type: Option<QuestionType>) -> ComposeResult<()> {
        if let Some(t) = question_type {
            self.check_type(t)?;
        }
        if question_type != self.filter.question_type {
            self.filter.question_type = question_type;
            self.page = 0;
        }
        Ok(())
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    /// 修改每页条数，尽量保持当前第一条仍然可见
    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        if page_size == self.page_size {
            return;
        }
        let first_visible = u64::from(self.page) * u64::from(self.page_size);
        self.page = u32::try_from(first_visible / u64::from(page_size)).unwrap_or(u32::MAX);
        self.page_size = page_size;
    }

    fn check_type(&self, question_type: QuestionType) -> ComposeResult<()> {
        if self.allowed_types.is_empty() || self.allowed_types.contains(&question_type) {
            Ok(())
        } else {
            Err(ComposeError::InvalidState {
                operation: "按题型筛选",
                state: "题型不在允许范围内",
            })
        }
    }

    // ========== 查询 ==========

    /// 发出一次查询，返回带令牌的查询内容
    pub fn begin_query(&mut self) -> QueryTicket {
        self.latest_token += 1;
        let ticket = QueryTicket {
            token: self.latest_token,
            query: CatalogQuery {
                collection_id: self.collection_id.clone(),
                filter: self.filter.clone(),
                page: self.page,
                page_size: self.page_size,
            },
        };
        debug!("发出题库查询 #{}: {:?}", ticket.token, ticket.query);
        ticket
    }

    /// 处理查询响应
    ///
    /// 令牌不是最新的一律丢弃；失败时不清空当前显示的结果
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: ComposeResult<CatalogPage>,
    ) -> QueryOutcome {
        if token != self.latest_token {
            warn!(
                "丢弃过期的题库响应 #{} (最新请求 #{})",
                token, self.latest_token
            );
            return QueryOutcome::Stale;
        }
        self.settled_token = token;

        match result {
            Ok(page) => {
                debug!(
                    "显示题库查询 #{}: {} 条 / 共 {} 条",
                    token,
                    page.items.len(),
                    page.total_count
                );
                self.displayed = page;
                self.last_error = None;
                self.clamp_page();
                QueryOutcome::Applied
            }
            Err(e) => {
                warn!("题库查询 #{} 失败，保留上一页结果: {}", token, e);
                self.last_error = Some(e.clone());
                QueryOutcome::Failed(e)
            }
        }
    }

    /// 页码越界时（例如筛选后总数变少）回到最后一页，下次查询生效
    fn clamp_page(&mut self) {
        let pages = self.total_pages();
        if pages > 0 && self.page >= pages {
            self.page = pages - 1;
        }
    }

    // ========== 只读查询 ==========

    pub fn items(&self) -> &[CandidateItem] {
        &self.displayed.items
    }

    pub fn total_count(&self) -> u64 {
        self.displayed.total_count
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.displayed.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest_token
    }

    /// 最新的查询还没有响应
    pub fn is_loading(&self) -> bool {
        self.settled_token != self.latest_token
    }

    pub fn last_error(&self) -> Option<&ComposeError> {
        self.last_error.as_ref()
    }
}

/// 执行一次题库查询
///
/// 不借用浏览器，宿主可以同时发出多次查询，再交给 `CatalogBrowser::complete` 排序
pub async fn fetch_page(
    store: &dyn CatalogStore,
    credentials: &dyn CredentialProvider,
    query: &CatalogQuery,
) -> ComposeResult<CatalogPage> {
    let credential = credentials
        .credential()
        .await
        .map_err(|_| ComposeError::Auth {
            operation: Operation::CatalogQuery,
        })?;

    store
        .query(&credential, query)
        .await
        .map_err(|e| match ComposeError::from_api(Operation::CatalogQuery, e) {
            ComposeError::NotFound { .. } => ComposeError::NotFound {
                what: format!("课程 {}", query.collection_id),
            },
            other => other,
        })
}
