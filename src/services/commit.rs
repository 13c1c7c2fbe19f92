//! 组卷提交 - 业务能力层
//!
//! 把最终选题和会话开始时的快照比较得到差量，作为一次替换式写入提交。
//! 同一试卷同时只允许一个提交在进行

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::clients::{AssignmentStore, AssignmentWrite};
use crate::error::{ComposeError, ComposeResult, Operation};
use crate::infrastructure::CredentialProvider;
use crate::models::AssignmentSnapshot;
use crate::services::selection::SelectionSet;

/// 相对快照的差量，ID 均已排序
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitDelta {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
    pub unchanged: Vec<String>,
}

impl CommitDelta {
    pub fn compute(selection: &SelectionSet, snapshot: &AssignmentSnapshot) -> Self {
        let selected = selection.ids();
        let attached = snapshot.ids();

        Self {
            to_add: sorted_ids(selected.difference(&attached)),
            to_remove: sorted_ids(attached.difference(&selected)),
            unchanged: sorted_ids(selected.intersection(&attached)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// BTreeSet 的集合运算本身有序
fn sorted_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter().map(|id| id.as_ref().to_string()).collect()
}

/// 提交成功的回执
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub composition_id: String,
    pub delta: CommitDelta,
    pub committed_at: DateTime<Local>,
}

/// 单飞许可，离开作用域时释放
#[derive(Debug)]
pub struct CommitPermit {
    composition_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl CommitPermit {
    pub fn composition_id(&self) -> &str {
        &self.composition_id
    }
}

impl Drop for CommitPermit {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        in_flight.remove(&self.composition_id);
    }
}

/// 组卷提交协调器
#[derive(Clone)]
pub struct CommitCoordinator {
    store: Arc<dyn AssignmentStore>,
    credentials: Arc<dyn CredentialProvider>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl CommitCoordinator {
    pub fn new(store: Arc<dyn AssignmentStore>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            store,
            credentials,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 占用该试卷的提交许可；已有提交在进行时拒绝
    pub fn try_begin(&self, composition_id: &str) -> ComposeResult<CommitPermit> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if !in_flight.insert(composition_id.to_string()) {
            warn!("试卷 {} 已有提交在进行，拒绝重复提交", composition_id);
            return Err(ComposeError::CommitInProgress {
                composition_id: composition_id.to_string(),
            });
        }
        Ok(CommitPermit {
            composition_id: composition_id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, composition_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(composition_id)
    }

    /// 提交选题
    ///
    /// # 参数
    /// - `composition_id`: 试卷ID
    /// - `selection`: 最终选题
    /// - `snapshot`: 会话开始时读到的已选题目
    pub async fn commit(
        &self,
        composition_id: &str,
        selection: &SelectionSet,
        snapshot: &AssignmentSnapshot,
    ) -> ComposeResult<CommitReceipt> {
        let permit = self.try_begin(composition_id)?;
        self.commit_with(&permit, selection, snapshot).await
    }

    /// 在已持有许可的情况下提交
    pub async fn commit_with(
        &self,
        permit: &CommitPermit,
        selection: &SelectionSet,
        snapshot: &AssignmentSnapshot,
    ) -> ComposeResult<CommitReceipt> {
        let composition_id = permit.composition_id();
        let delta = CommitDelta::compute(selection, snapshot);

        info!(
            "📤 提交试卷 {}: 新增 {} 题, 移除 {} 题, 保留 {} 题",
            composition_id,
            delta.to_add.len(),
            delta.to_remove.len(),
            delta.unchanged.len()
        );

        let credential = self
            .credentials
            .credential()
            .await
            .map_err(|_| ComposeError::Auth {
                operation: Operation::Commit,
            })?;

        let write = AssignmentWrite {
            composition_id: composition_id.to_string(),
            question_ids: selection.ids().into_iter().map(str::to_string).collect(),
            add: delta.to_add.clone(),
            remove: delta.to_remove.clone(),
        };
        debug!("替换式写入: {:?}", write);

        self.store
            .set_assigned(&credential, &write)
            .await
            .map_err(|e| match ComposeError::from_api(Operation::Commit, e) {
                ComposeError::NotFound { .. } => ComposeError::NotFound {
                    what: format!("试卷 {}", composition_id),
                },
                other => other,
            })?;

        Ok(CommitReceipt {
            composition_id: composition_id.to_string(),
            delta,
            committed_at: Local::now(),
        })
    }
}
