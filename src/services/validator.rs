//! 组卷校验 - 业务能力层
//!
//! 纯内存计算，不需要网络

use crate::error::{ValidationReport, Violation};
use crate::models::{CompositionSpec, Tier};
use crate::services::selection::SelectionSet;

/// 组卷校验器
pub struct ComposeValidator;

impl ComposeValidator {
    /// 一次算出所有违规：先按难度顺序列出各难度的不符，再列出总数不符
    pub fn validate(
        selection: &SelectionSet,
        spec: &CompositionSpec,
    ) -> Result<(), ValidationReport> {
        let mut violations = Vec::new();

        for tier in Tier::ALL {
            let expected = spec.tier_counts.get(tier);
            let actual = selection.count_by_tier(tier) as u32;
            if actual != expected {
                violations.push(Violation::Tier {
                    tier,
                    expected,
                    actual,
                });
            }
        }

        let actual = selection.size() as u32;
        if actual != spec.total {
            violations.push(Violation::Total {
                expected: spec.total,
                actual,
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { violations })
        }
    }
}
