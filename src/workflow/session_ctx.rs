//! 编辑会话上下文
//!
//! 封装"我正在给哪门课的哪张试卷选题"这一信息

use std::fmt::Display;

use crate::models::CompositionSpec;

/// 编辑会话上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCtx {
    /// 试卷ID
    pub composition_id: String,

    /// 所属课程ID
    pub collection_id: String,
}

impl SessionCtx {
    pub fn new(composition_id: String, collection_id: String) -> Self {
        Self {
            composition_id,
            collection_id,
        }
    }
}

impl From<&CompositionSpec> for SessionCtx {
    fn from(spec: &CompositionSpec) -> Self {
        Self::new(spec.composition_id.clone(), spec.collection_id.clone())
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[试卷 ID#{} 课程 ID#{}]",
            self.composition_id, self.collection_id
        )
    }
}
