//! 集成测试共用的内存存储和凭证
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture};
use tokio::sync::Notify;

use test_composer::clients::{AssignmentStore, AssignmentWrite, CatalogStore};
use test_composer::error::{ApiError, ApiResult};
use test_composer::infrastructure::{Credential, CredentialProvider, ReauthRequired};
use test_composer::models::{
    CandidateItem, CatalogPage, CatalogQuery, CompositionSpec, QuestionType, SelectionEntry, Tier,
    TierCounts,
};
use test_composer::workflow::Collaborators;

pub const COURSE: &str = "C1";
pub const TEST: &str = "T1";

pub fn item(id: &str, tier: Tier) -> CandidateItem {
    item_of_type(id, tier, QuestionType::SingleChoice)
}

pub fn item_of_type(id: &str, tier: Tier, question_type: QuestionType) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        content: format!("<p>题目 {}</p>", id),
        tier,
        question_type,
        collection_id: COURSE.to_string(),
    }
}

pub fn entry(id: &str, tier: Tier) -> SelectionEntry {
    SelectionEntry::from(&item(id, tier))
}

/// 5 题：简单 2 / 中等 2 / 困难 1
pub fn spec_5_221() -> CompositionSpec {
    CompositionSpec {
        composition_id: TEST.to_string(),
        collection_id: COURSE.to_string(),
        total: 5,
        tier_counts: TierCounts::new(2, 2, 1),
        allowed_types: BTreeSet::new(),
    }
}

/// 题库：E1..E4 简单，M1..M4 中等，H1..H3 困难
pub fn standard_catalog() -> Vec<CandidateItem> {
    let mut items = Vec::new();
    for i in 1..=4 {
        items.push(item(&format!("E{}", i), Tier::Easy));
    }
    for i in 1..=4 {
        items.push(item(&format!("M{}", i), Tier::Medium));
    }
    for i in 1..=3 {
        items.push(item(&format!("H{}", i), Tier::Hard));
    }
    items
}

/// 可控的凭证提供者
#[derive(Default)]
pub struct FakeCredentials {
    pub reauth: AtomicBool,
}

impl CredentialProvider for FakeCredentials {
    fn credential(&self) -> BoxFuture<'_, Result<Credential, ReauthRequired>> {
        let result = if self.reauth.load(Ordering::SeqCst) {
            Err(ReauthRequired)
        } else {
            Ok(Credential::bearer("test-token"))
        };
        Box::pin(future::ready(result))
    }
}

/// 内存中的题库和试卷题目关系
pub struct MemoryStore {
    catalog: Vec<CandidateItem>,
    assigned: Mutex<BTreeMap<String, Vec<SelectionEntry>>>,
    pub writes: Mutex<Vec<AssignmentWrite>>,
    pub queries: AtomicUsize,
    /// 接下来多少次查询返回网络错误
    pub failing_queries: AtomicUsize,
    /// 查询返回 401
    pub unauthorized_queries: AtomicBool,
    /// 接下来多少次提交返回网络错误
    pub failing_commits: AtomicUsize,
    /// 提交时试卷已被删除
    pub composition_gone: AtomicBool,
    /// 设置后，提交会等待放行
    pub commit_gate: Mutex<Option<Arc<Notify>>>,
    /// 提交已进入存储
    pub commit_entered: Arc<Notify>,
}

impl MemoryStore {
    pub fn new(catalog: Vec<CandidateItem>) -> Self {
        Self {
            catalog,
            assigned: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
            failing_queries: AtomicUsize::new(0),
            unauthorized_queries: AtomicBool::new(false),
            failing_commits: AtomicUsize::new(0),
            composition_gone: AtomicBool::new(false),
            commit_gate: Mutex::new(None),
            commit_entered: Arc::new(Notify::new()),
        }
    }

    pub fn with_assigned(self, composition_id: &str, entries: Vec<SelectionEntry>) -> Self {
        self.assigned
            .lock()
            .unwrap()
            .insert(composition_id.to_string(), entries);
        self
    }

    pub fn assigned_ids(&self, composition_id: &str) -> BTreeSet<String> {
        self.assigned
            .lock()
            .unwrap()
            .get(composition_id)
            .map(|entries| entries.iter().map(|e| e.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn gate_commits(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.commit_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    fn lookup(&self, id: &str, existing: &[SelectionEntry]) -> SelectionEntry {
        existing
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .or_else(|| {
                self.catalog
                    .iter()
                    .find(|c| c.id == id)
                    .map(SelectionEntry::from)
            })
            .unwrap_or_else(|| entry(id, Tier::Easy))
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CatalogStore for MemoryStore {
    fn query<'a>(
        &'a self,
        _credential: &'a Credential,
        query: &'a CatalogQuery,
    ) -> BoxFuture<'a, ApiResult<CatalogPage>> {
        Box::pin(async move {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let endpoint = format!("/api/courses/{}/questions", query.collection_id);

            if self.unauthorized_queries.load(Ordering::SeqCst) {
                return Err(ApiError::Unauthorized { endpoint });
            }
            if Self::take_one(&self.failing_queries) {
                return Err(ApiError::RequestFailed {
                    endpoint,
                    message: "connection reset".to_string(),
                });
            }

            let matching: Vec<CandidateItem> = self
                .catalog
                .iter()
                .filter(|c| c.collection_id == query.collection_id)
                .filter(|c| match query.filter.text.as_deref() {
                    Some(text) => c.content.contains(text),
                    None => true,
                })
                .filter(|c| query.filter.tier.map_or(true, |t| c.tier == t))
                .filter(|c| query.filter.question_type.map_or(true, |t| c.question_type == t))
                .cloned()
                .collect();

            let start = (query.page * query.page_size) as usize;
            let items = matching
                .iter()
                .skip(start)
                .take(query.page_size as usize)
                .cloned()
                .collect();

            Ok(CatalogPage {
                items,
                total_count: matching.len() as u64,
            })
        })
    }
}

impl AssignmentStore for MemoryStore {
    fn get_assigned<'a>(
        &'a self,
        _credential: &'a Credential,
        composition_id: &'a str,
    ) -> BoxFuture<'a, ApiResult<Vec<SelectionEntry>>> {
        Box::pin(async move {
            self.assigned
                .lock()
                .unwrap()
                .get(composition_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound {
                    endpoint: format!("/api/tests/{}/questions", composition_id),
                })
        })
    }

    fn set_assigned<'a>(
        &'a self,
        _credential: &'a Credential,
        write: &'a AssignmentWrite,
    ) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            self.commit_entered.notify_one();
            let gate = self.commit_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            if self.composition_gone.load(Ordering::SeqCst) {
                return Err(ApiError::NotFound {
                    endpoint: format!("/api/tests/{}/questions", write.composition_id),
                });
            }
            if Self::take_one(&self.failing_commits) {
                return Err(ApiError::RequestFailed {
                    endpoint: format!("/api/tests/{}/questions", write.composition_id),
                    message: "gateway timeout".to_string(),
                });
            }

            self.writes.lock().unwrap().push(write.clone());

            let mut assigned = self.assigned.lock().unwrap();
            let existing = assigned
                .get(&write.composition_id)
                .cloned()
                .unwrap_or_default();
            let replaced = write
                .question_ids
                .iter()
                .map(|id| self.lookup(id, &existing))
                .collect();
            assigned.insert(write.composition_id.clone(), replaced);
            Ok(())
        })
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub credentials: Arc<FakeCredentials>,
    pub collaborators: Collaborators,
}

pub fn fixture(store: MemoryStore) -> Fixture {
    let store = Arc::new(store);
    let credentials = Arc::new(FakeCredentials::default());
    let collaborators = Collaborators::new(store.clone(), store.clone(), credentials.clone());
    Fixture {
        store,
        credentials,
        collaborators,
    }
}
