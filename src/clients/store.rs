//! 存储接口
//!
//! 题库和试卷题目关系都是外部存储，这里只定义本系统需要的最小接口

use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::ApiResult;
use crate::infrastructure::Credential;
use crate::models::{CatalogPage, CatalogQuery, SelectionEntry};

/// 一次替换式写入
///
/// `question_ids` 是期望的最终成员，存储必须以它为准整体替换。
/// `add` / `remove` 是相对会话打开时快照的差量，只供审计；
/// 重复提交时快照可能已过期，差量不能再次按增删应用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentWrite {
    #[serde(skip)]
    pub composition_id: String,

    #[serde(rename = "questionIds")]
    pub question_ids: Vec<String>,

    pub add: Vec<String>,

    pub remove: Vec<String>,
}

/// 题库查询
pub trait CatalogStore: Send + Sync {
    fn query<'a>(
        &'a self,
        credential: &'a Credential,
        query: &'a CatalogQuery,
    ) -> BoxFuture<'a, ApiResult<CatalogPage>>;
}

/// 试卷已选题目读写
pub trait AssignmentStore: Send + Sync {
    fn get_assigned<'a>(
        &'a self,
        credential: &'a Credential,
        composition_id: &'a str,
    ) -> BoxFuture<'a, ApiResult<Vec<SelectionEntry>>>;

    fn set_assigned<'a>(
        &'a self,
        credential: &'a Credential,
        write: &'a AssignmentWrite,
    ) -> BoxFuture<'a, ApiResult<()>>;
}
