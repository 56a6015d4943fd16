// ==========================================
// 提案 → 分配记录 / 分配事件
// ==========================================

use crate::domain::assignment::{Assignment, AssignmentRationale};
use crate::domain::dock_event::{ChoiceDetail, DockEvent, ReasonDetail};
use crate::domain::proposal::Proposal;
use crate::domain::types::{new_id, AllocationStrategy, AssignmentStatus, DockEventType};
use chrono::NaiveDateTime;

pub(super) fn build_assignment(proposal: &Proposal, confidence: f64, now: NaiveDateTime) -> Assignment {
    Assignment {
        assignment_id: new_id("asg"),
        location: proposal.location.clone(),
        door_id: proposal.door_id.clone(),
        job_kind: proposal.job_kind,
        ref_id: proposal.ref_id.clone(),
        start: proposal.start,
        end: proposal.end,
        crew_label: proposal.feasibility.crew_label.clone(),
        status: AssignmentStatus::Scheduled,
        rationale: AssignmentRationale {
            strategy: proposal.strategy,
            local_cost: proposal.local_cost,
            wait_min: proposal.wait_min,
            lateness_min: proposal.lateness_min,
            priority: proposal.priority,
            earliest_ready: proposal.earliest_ready,
            confidence,
        },
        created_at: now,
    }
}

/// assigned 事件: 原因码随提案来源（启发式 / 求解器）
pub(super) fn build_assigned_event(assignment: &Assignment, confidence: f64, now: NaiveDateTime) -> DockEvent {
    let detail = ChoiceDetail {
        assignment_id: assignment.assignment_id.clone(),
        local_cost: assignment.rationale.local_cost,
        wait_min: assignment.rationale.wait_min,
        lateness_min: assignment.rationale.lateness_min,
        confidence,
    };
    let reason_detail = match assignment.rationale.strategy {
        AllocationStrategy::Heuristic => ReasonDetail::HeuristicChoice(detail),
        AllocationStrategy::Solver => ReasonDetail::SolverChoice(detail),
    };

    DockEvent {
        event_id: new_id("evt"),
        ts: now,
        location: assignment.location.clone(),
        door_id: assignment.door_id.clone(),
        job_kind: Some(assignment.job_kind),
        ref_id: Some(assignment.ref_id.clone()),
        event_type: DockEventType::Assigned,
        reason_detail,
    }
}
