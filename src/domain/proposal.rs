// ==========================================
// 装卸月台门分配系统 - 提案与决策
// ==========================================
// Proposal: 临时候选绑定，永不单独落库
// Decision: 一批提案的提交结果
// ==========================================

use crate::domain::time_window::TimeWindow;
use crate::domain::types::{AllocationStrategy, JobKind};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Feasibility - 可行性标记
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feasibility {
    pub crew_label: String, // 班组标签（默认 auto，由现场排班决定）
    pub equipment_ok: bool, // 分配器视角下的叉车可用性
}

impl Default for Feasibility {
    fn default() -> Self {
        Self {
            crew_label: "auto".to_string(),
            equipment_ok: true,
        }
    }
}

// ==========================================
// Proposal - 门分配提案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: String,
    pub task_id: String,
    pub job_kind: JobKind,
    pub ref_id: String,
    pub location: String,
    pub door_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub local_cost: i64,     // wait + 2*lateness - 5*priority
    pub wait_min: i64,
    pub lateness_min: i64,
    pub priority: i64,
    pub earliest_ready: NaiveDateTime,
    pub strategy: AllocationStrategy,
    pub feasibility: Feasibility,
}

impl Proposal {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

// ==========================================
// ValidationFailure - 硬约束失败原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationFailure {
    /// 门不存在、未启用或不属于该站点
    InactiveOrMissingDoor { door_id: String },
    /// 与同门已有的 scheduled/in_progress 分配重叠
    DoubleBooking {
        door_id: String,
        conflicting_assignment_id: String,
    },
    /// 时段内完全没有资源日历
    NoResourceCalendar { location: String },
    /// 有日历覆盖但班组/叉车不足（含覆盖缺口）
    InsufficientResources { min_crews: i64, min_forklifts: i64 },
}

impl ValidationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::InactiveOrMissingDoor { .. } => "inactive_or_missing_door",
            ValidationFailure::DoubleBooking { .. } => "double_booking",
            ValidationFailure::NoResourceCalendar { .. } => "no_resource_calendar",
            ValidationFailure::InsufficientResources { .. } => "insufficient_resources",
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::InactiveOrMissingDoor { door_id } => {
                write!(f, "inactive_or_missing_door: door_id={}", door_id)
            }
            ValidationFailure::DoubleBooking {
                door_id,
                conflicting_assignment_id,
            } => write!(
                f,
                "double_booking: door_id={}, conflicting_assignment_id={}",
                door_id, conflicting_assignment_id
            ),
            ValidationFailure::NoResourceCalendar { location } => {
                write!(f, "no_resource_calendar: location={}", location)
            }
            ValidationFailure::InsufficientResources {
                min_crews,
                min_forklifts,
            } => write!(
                f,
                "insufficient_resources: min_crews={}, min_forklifts={}",
                min_crews, min_forklifts
            ),
        }
    }
}

// ==========================================
// RejectionReason - 提案被拒原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// 硬约束校验失败
    Validation { failure: ValidationFailure },
    /// 校验通过但置信度低于阈值（代价/延误过高）
    LowConfidence { confidence: f64, threshold: f64 },
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Validation { failure } => failure.code(),
            RejectionReason::LowConfidence { .. } => "low_confidence",
        }
    }
}

// ==========================================
// Decision - 批次决策结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedProposal {
    pub proposal: Proposal,
    pub assignment_id: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub proposal_id: String,
    pub ref_id: String,
    pub door_id: String,
    pub reason: RejectionReason,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: String,
    pub accepted: Vec<AcceptedProposal>,
    pub confidence: f64,      // 已接受提案的平均置信度，无接受时为 0.0
    pub why: Vec<String>,     // 依据标签
    pub rejections: Vec<Rejection>,
    pub unassigned: Vec<String>, // 批量优化未落位的作业
}

impl Decision {
    /// 空决策（无门 / 无可行分配）
    pub fn empty(decision_id: String, why: Vec<String>) -> Self {
        Self {
            decision_id,
            accepted: Vec::new(),
            confidence: 0.0,
            why,
            rejections: Vec::new(),
            unassigned: Vec::new(),
        }
    }

    pub fn accepted_proposals(&self) -> Vec<&Proposal> {
        self.accepted.iter().map(|a| &a.proposal).collect()
    }

    /// 平均置信度
    pub fn mean_confidence(accepted: &[AcceptedProposal]) -> f64 {
        if accepted.is_empty() {
            return 0.0;
        }
        accepted.iter().map(|a| a.confidence).sum::<f64>() / accepted.len() as f64
    }
}
