//! 管理后台 API 客户端
//!
//! 封装题库查询和试卷题目读写的 REST 调用

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use crate::clients::store::{AssignmentStore, AssignmentWrite, CatalogStore};
use crate::error::ApiResult;
use crate::infrastructure::{Credential, HttpExecutor};
use crate::models::{CatalogPage, CatalogQuery, SelectionEntry};

/// 管理后台 API 客户端
pub struct StoreClient {
    http: HttpExecutor,
}

/// `GET /api/tests/{id}/questions` 的响应体
#[derive(Debug, Deserialize)]
struct AssignedResponse {
    #[serde(default)]
    items: Vec<SelectionEntry>,
}

impl StoreClient {
    pub fn new(http: HttpExecutor) -> Self {
        Self { http }
    }

    fn catalog_path(collection_id: &str) -> [&str; 4] {
        ["api", "courses", collection_id, "questions"]
    }

    fn assignment_path(composition_id: &str) -> [&str; 4] {
        ["api", "tests", composition_id, "questions"]
    }

    /// 查询题库的一页
    pub async fn fetch_catalog(
        &self,
        credential: &Credential,
        query: &CatalogQuery,
    ) -> ApiResult<CatalogPage> {
        let path = Self::catalog_path(&query.collection_id);
        let params = query.to_params();

        debug!("题库查询 {:?} 参数: {:?}", path, params);

        let page: CatalogPage = self.http.get_json(&path, &params, credential).await?;

        debug!(
            "题库查询返回 {} 条 / 共 {} 条",
            page.items.len(),
            page.total_count
        );
        Ok(page)
    }

    /// 读取试卷当前已选题目
    pub async fn fetch_assigned(
        &self,
        credential: &Credential,
        composition_id: &str,
    ) -> ApiResult<Vec<SelectionEntry>> {
        let path = Self::assignment_path(composition_id);
        let response: AssignedResponse = self.http.get_json(&path, &[], credential).await?;
        Ok(response.items)
    }

    /// 替换试卷已选题目
    pub async fn replace_assigned(
        &self,
        credential: &Credential,
        write: &AssignmentWrite,
    ) -> ApiResult<()> {
        let path = Self::assignment_path(&write.composition_id);

        debug!(
            "提交试卷题目 {:?} Payload: {}",
            path,
            serde_json::to_string(write).unwrap_or_default()
        );

        self.http.put_json(&path, write, credential).await
    }
}

impl CatalogStore for StoreClient {
    fn query<'a>(
        &'a self,
        credential: &'a Credential,
        query: &'a CatalogQuery,
    ) -> BoxFuture<'a, ApiResult<CatalogPage>> {
        Box::pin(self.fetch_catalog(credential, query))
    }
}

impl AssignmentStore for StoreClient {
    fn get_assigned<'a>(
        &'a self,
        credential: &'a Credential,
        composition_id: &'a str,
    ) -> BoxFuture<'a, ApiResult<Vec<SelectionEntry>>> {
        Box::pin(self.fetch_assigned(credential, composition_id))
    }

    fn set_assigned<'a>(
        &'a self,
        credential: &'a Credential,
        write: &'a AssignmentWrite,
    ) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(self.replace_assigned(credential, write))
    }
}
