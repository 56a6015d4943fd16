// ==========================================
// 装卸月台门分配系统 - 溯源事件领域模型
// ==========================================
// 对齐: dock_events 表
// 红线: 只追加，不修改
// reason_detail 按 reason_code 分变体建模，穷举匹配
// ==========================================

use crate::domain::types::{DockEventType, JobKind, ReasonCode};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// DockEvent - 溯源事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockEvent {
    pub event_id: String,
    pub ts: NaiveDateTime,
    pub location: String,
    pub door_id: String,
    pub job_kind: Option<JobKind>, // reassigned 事件记录被替换的作业
    pub ref_id: Option<String>,
    pub event_type: DockEventType,
    pub reason_detail: ReasonDetail,
}

impl DockEvent {
    pub fn reason_code(&self) -> ReasonCode {
        self.reason_detail.reason_code()
    }
}

// ==========================================
// ReassignmentParty - 改派双方快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentParty {
    pub assignment_id: String,
    pub ref_id: String,
    pub job_kind: JobKind,
    pub priority: i64,
    pub earliest_ready: NaiveDateTime,
    pub start: NaiveDateTime,
}

// ==========================================
// ReasonDetail - 结构化原因明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason_code", rename_all = "snake_case")]
pub enum ReasonDetail {
    HeuristicChoice(ChoiceDetail),
    SolverChoice(ChoiceDetail),
    PriorityChange {
        previous: ReassignmentParty,
        new: ReassignmentParty,
        priority_delta: i64,
    },
    EtaSlip {
        previous: ReassignmentParty,
        new: ReassignmentParty,
        eta_delta_minutes: i64,
    },
    OperationalConflict {
        previous: ReassignmentParty,
        new: ReassignmentParty,
        competing_assignment_count: i64,
    },
    NormalCompletion {
        assignment_id: String,
        duration_minutes: i64,
    },
    Cancelled {
        assignment_id: String,
        note: Option<String>,
    },
}

/// 分配事件明细（启发式 / 求解器共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDetail {
    pub assignment_id: String,
    pub local_cost: i64,
    pub wait_min: i64,
    pub lateness_min: i64,
    pub confidence: f64,
}

impl ReasonDetail {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            ReasonDetail::HeuristicChoice(_) => ReasonCode::HeuristicChoice,
            ReasonDetail::SolverChoice(_) => ReasonCode::SolverChoice,
            ReasonDetail::PriorityChange { .. } => ReasonCode::PriorityChange,
            ReasonDetail::EtaSlip { .. } => ReasonCode::EtaSlip,
            ReasonDetail::OperationalConflict { .. } => ReasonCode::OperationalConflict,
            ReasonDetail::NormalCompletion { .. } => ReasonCode::NormalCompletion,
            ReasonDetail::Cancelled { .. } => ReasonCode::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn party(id: &str, priority: i64) -> ReassignmentParty {
        ReassignmentParty {
            assignment_id: format!("asg-{}", id),
            ref_id: id.to_string(),
            job_kind: JobKind::Inbound,
            priority,
            earliest_ready: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            start: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_reason_detail_json_carries_reason_code_tag() {
        let detail = ReasonDetail::PriorityChange {
            previous: party("T-001", 0),
            new: party("T-002", 2),
            priority_delta: 2,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["reason_code"], "priority_change");
        assert_eq!(json["priority_delta"], 2);

        let back: ReasonDetail = serde_json::from_value(json).unwrap();
        assert_eq!(back.reason_code(), ReasonCode::PriorityChange);
    }

    #[test]
    fn test_choice_detail_is_flattened_under_tag() {
        let detail = ReasonDetail::SolverChoice(ChoiceDetail {
            assignment_id: "asg-1".to_string(),
            local_cost: -5,
            wait_min: 0,
            lateness_min: 0,
            confidence: 1.0,
        });
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["reason_code"], "solver_choice");
        assert_eq!(json["assignment_id"], "asg-1");
    }
}
