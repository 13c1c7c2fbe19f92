use serde::{Deserialize, Serialize};

use crate::models::composition::CompositionSpec;
use crate::models::filter::CatalogFilter;

/// 宿主执行的选题计划
///
/// 由操作员事先列出要加入和移除的题目ID，宿主逐页浏览题库并勾选
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionPlan {
    pub spec: CompositionSpec,

    /// 要加入的题目ID
    #[serde(default)]
    pub select: Vec<String>,

    /// 要从已选中移除的题目ID
    #[serde(default)]
    pub deselect: Vec<String>,

    /// 浏览时使用的筛选条件
    #[serde(default)]
    pub filter: CatalogFilter,

    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl CompositionPlan {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}
