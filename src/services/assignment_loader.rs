//! 已选题目加载 - 业务能力层
//!
//! 只负责读取试卷当前挂载的题目，作为本次编辑的基线

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::AssignmentStore;
use crate::error::{ComposeError, ComposeResult, Operation};
use crate::infrastructure::CredentialProvider;
use crate::models::AssignmentSnapshot;

/// 已选题目加载器
pub struct AssignmentLoader {
    store: Arc<dyn AssignmentStore>,
    credentials: Arc<dyn CredentialProvider>,
}

impl AssignmentLoader {
    pub fn new(store: Arc<dyn AssignmentStore>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { store, credentials }
    }

    /// 读取试卷已选题目快照
    ///
    /// 失败时已转换为组卷错误分类，调用方不应继续打开编辑器
    pub async fn load(&self, composition_id: &str) -> ComposeResult<AssignmentSnapshot> {
        let credential = self
            .credentials
            .credential()
            .await
            .map_err(|_| ComposeError::Auth {
                operation: Operation::AssignmentLoad,
            })?;

        let entries = self
            .store
            .get_assigned(&credential, composition_id)
            .await
            .map_err(|e| match ComposeError::from_api(Operation::AssignmentLoad, e) {
                ComposeError::NotFound { .. } => ComposeError::NotFound {
                    what: format!("试卷 {}", composition_id),
                },
                other => other,
            })?;

        debug!("试卷 {} 已有题目: {:?}", composition_id, entries);
        let snapshot = AssignmentSnapshot::new(composition_id, entries);
        info!("✓ 试卷 {} 已有 {} 道题目", composition_id, snapshot.len());

        Ok(snapshot)
    }
}
