// ==========================================
// 装卸月台门分配系统 - 置信度评分
// ==========================================
// base = 通过 ? 1 : 0
// late_penalty = min(lateness/60, 1) * 0.3
// cost_penalty = min(max(cost, 0)/60, 1) * 0.3
// confidence = clamp(base - late - cost - accumulated, 0, 1)
// ==========================================

use crate::domain::proposal::Proposal;

const PENALTY_WEIGHT: f64 = 0.3;
const PENALTY_SCALE_MIN: f64 = 60.0;

/// 评分结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScore {
    pub confidence: f64,
    pub accepted: bool,
}

// ==========================================
// ConfidenceScorer - 置信度评分器
// ==========================================
pub struct ConfidenceScorer {
    threshold: f64,
}

impl ConfidenceScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// # 参数
    /// - `passed`: 硬约束是否通过
    /// - `accumulated_penalty`: 同批次此前拒绝累加的惩罚
    pub fn score(&self, proposal: &Proposal, passed: bool, accumulated_penalty: f64) -> ConfidenceScore {
        let base = if passed { 1.0 } else { 0.0 };
        let late_penalty = (proposal.lateness_min as f64 / PENALTY_SCALE_MIN).min(1.0) * PENALTY_WEIGHT;
        let cost_penalty =
            (proposal.local_cost.max(0) as f64 / PENALTY_SCALE_MIN).min(1.0) * PENALTY_WEIGHT;

        let confidence = (base - late_penalty - cost_penalty - accumulated_penalty).clamp(0.0, 1.0);

        ConfidenceScore {
            confidence,
            accepted: passed && confidence >= self.threshold,
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(0.6)
    }
}
