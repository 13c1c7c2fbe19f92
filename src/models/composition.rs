use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::models::question::{QuestionType, SelectionEntry, Tier};

/// 各难度要求的题数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierCounts {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
}

impl TierCounts {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self { easy, medium, hard }
    }

    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Easy => self.easy,
            Tier::Medium => self.medium,
            Tier::Hard => self.hard,
        }
    }

    /// 按 u64 求和，三项都取上限也不会溢出
    pub fn sum(&self) -> u64 {
        u64::from(self.easy) + u64::from(self.medium) + u64::from(self.hard)
    }
}

/// 组卷规格：选题必须恰好满足的数量约束
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSpec {
    /// 试卷ID
    pub composition_id: String,

    /// 所属课程ID
    pub collection_id: String,

    /// 题目总数
    pub total: u32,

    /// 各难度题数
    pub tier_counts: TierCounts,

    /// 允许的题型，为空表示不限
    #[serde(default)]
    pub allowed_types: BTreeSet<QuestionType>,
}

impl CompositionSpec {
    /// 检查规格本身能否被满足
    pub fn check(&self) -> Result<(), SpecError> {
        if self.composition_id.trim().is_empty() {
            return Err(SpecError::MissingComposition);
        }
        if self.collection_id.trim().is_empty() {
            return Err(SpecError::MissingCollection);
        }
        if self.total == 0 {
            return Err(SpecError::ZeroTotal);
        }
        let sum = self.tier_counts.sum();
        if sum != u64::from(self.total) {
            return Err(SpecError::TierSumMismatch {
                total: self.total,
                sum,
            });
        }
        Ok(())
    }

    pub fn allows(&self, question_type: QuestionType) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.contains(&question_type)
    }
}

/// 从存储读到的已选题目快照，会话期间不修改
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssignmentSnapshot {
    pub composition_id: String,
    pub entries: BTreeMap<String, SelectionEntry>,
}

impl AssignmentSnapshot {
    pub fn new(composition_id: impl Into<String>, entries: Vec<SelectionEntry>) -> Self {
        Self {
            composition_id: composition_id.into(),
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn ids(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
