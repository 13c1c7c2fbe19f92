use regex::Regex;
use serde::{Deserialize, Serialize};

/// 难度等级（有序：简单 < 中等 < 困难）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    /// 全部难度，按等级顺序
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }

    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            Tier::Easy => "简单",
            Tier::Medium => "中等",
            Tier::Hard => "困难",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 题型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    FillBlank,
    FreeResponse,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultiChoice => "multi_choice",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::FreeResponse => "free_response",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "单选题",
            QuestionType::MultiChoice => "多选题",
            QuestionType::FillBlank => "填空题",
            QuestionType::FreeResponse => "问答题",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 题库中的候选题目，查询时的快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,

    /// 题干（富文本 HTML）
    #[serde(default)]
    pub content: String,

    #[serde(rename = "level")]
    pub tier: Tier,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(rename = "courseId")]
    pub collection_id: String,
}

impl CandidateItem {
    /// 去掉 HTML 标签后的纯文本预览
    pub fn preview(&self, max_len: usize) -> String {
        let plain = match Regex::new(r"<[^>]*>") {
            Ok(re) => re.replace_all(&self.content, "").into_owned(),
            Err(_) => self.content.clone(),
        };
        crate::utils::logging::truncate_text(plain.trim(), max_len)
    }
}

impl std::fmt::Display for CandidateItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} [{} / {}]",
            self.id,
            self.preview(80),
            self.tier,
            self.question_type
        )
    }
}

/// 已选题目记录
///
/// 在选中时复制校验需要的字段，之后翻页或换筛选条件都不影响它
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub id: String,

    #[serde(rename = "level")]
    pub tier: Tier,

    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

impl From<&CandidateItem> for SelectionEntry {
    fn from(item: &CandidateItem) -> Self {
        Self {
            id: item.id.clone(),
            tier: item.tier,
            question_type: item.question_type,
        }
    }
}

/// 一页题库查询结果
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<CandidateItem>,

    #[serde(rename = "totalCount")]
    pub total_count: u64,
}
