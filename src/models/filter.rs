use serde::{Deserialize, Serialize};

use crate::models::question::{QuestionType, Tier};

/// 操作员可编辑的筛选条件
///
/// 所属课程不在这里：它在整个会话内固定
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// 题干模糊匹配
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub tier: Option<Tier>,

    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
}

impl CatalogFilter {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tier.is_none() && self.question_type.is_none()
    }
}

/// 发往题库的一次查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub collection_id: String,
    pub filter: CatalogFilter,
    /// 从 0 开始
    pub page: u32,
    pub page_size: u32,
}

impl CatalogQuery {
    /// 转为 URL 查询参数，空条件不发送
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.page_size.to_string()),
        ];
        if let Some(text) = self.filter.text.as_deref() {
            let text = text.trim();
            if !text.is_empty() {
                params.push(("content", text.to_string()));
            }
        }
        if let Some(tier) = self.filter.tier {
            params.push(("level", tier.as_str().to_string()));
        }
        if let Some(question_type) = self.filter.question_type {
            params.push(("type", question_type.as_str().to_string()));
        }
        params
    }
}
