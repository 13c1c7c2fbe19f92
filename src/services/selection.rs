//! 已选题目集合 - 业务能力层
//!
//! 与当前显示哪一页、哪个筛选条件无关的选题状态。
//! 所有修改都通过 `SelectionEvent` 进入唯一的 `apply`，勾选逻辑只在这里

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{ComposeError, ComposeResult};
use crate::models::{AssignmentSnapshot, CandidateItem, SelectionEntry, Tier};

/// 勾选事件
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    /// 勾选 / 取消单个题目
    Toggle { item: CandidateItem, selected: bool },
    /// 对给定的一批题目统一勾选 / 取消（通常是当前页）
    BulkToggle {
        items: Vec<CandidateItem>,
        selected: bool,
    },
    /// 按ID移除（题目不在当前页时使用）
    Remove { ids: Vec<String> },
    /// 清空（提交成功或取消后）
    Clear,
}

/// 已选题目集合，按题目ID去重
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: BTreeMap<String, SelectionEntry>,
    seeded: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用试卷已有题目初始化，只能调用一次且必须在浏览之前
    pub fn seed(&mut self, snapshot: &AssignmentSnapshot) -> ComposeResult<()> {
        if self.seeded {
            return Err(ComposeError::InvalidState {
                operation: "seed",
                state: "seeded",
            });
        }
        for (id, entry) in &snapshot.entries {
            self.entries.insert(id.clone(), entry.clone());
        }
        self.seeded = true;
        debug!("已用 {} 道已选题目初始化", snapshot.len());
        Ok(())
    }

    /// 处理一个勾选事件，返回实际发生变化的题目数
    pub fn apply(&mut self, event: SelectionEvent) -> usize {
        match event {
            SelectionEvent::Toggle { item, selected } => usize::from(self.toggle(&item, selected)),
            SelectionEvent::BulkToggle { items, selected } => self.bulk_toggle(&items, selected),
            SelectionEvent::Remove { ids } => ids
                .iter()
                .filter(|id| self.entries.remove(id.as_str()).is_some())
                .count(),
            SelectionEvent::Clear => {
                let removed = self.entries.len();
                self.entries.clear();
                removed
            }
        }
    }

    /// 勾选时记录题目当时的难度和题型；取消时只删这一个ID
    pub fn toggle(&mut self, item: &CandidateItem, selected: bool) -> bool {
        if selected {
            if self.entries.contains_key(&item.id) {
                return false;
            }
            self.entries
                .insert(item.id.clone(), SelectionEntry::from(item));
            true
        } else {
            self.entries.remove(&item.id).is_some()
        }
    }

    /// 只作用于给定的题目，其他已选题目（包括不在当前页的）不受影响
    pub fn bulk_toggle(&mut self, items: &[CandidateItem], selected: bool) -> usize {
        items
            .iter()
            .filter(|item| self.toggle(item, selected))
            .count()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_by_tier(&self, tier: Tier) -> usize {
        self.entries.values().filter(|e| e.tier == tier).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.values()
    }
}
