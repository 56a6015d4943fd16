use super::*;
use crate::db::{configure_sqlite_connection, init_schema};
use crate::domain::door::{Door, ResourceCalendarSlot};
use crate::domain::dock_event::ReasonDetail;
use crate::domain::proposal::{Feasibility, ValidationFailure};
use crate::domain::types::{AllocationStrategy, JobKind, ReasonCode};
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use std::sync::Mutex;

// ==========================================
// 测试辅助函数
// ==========================================

fn t(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn setup() -> (DockRepositories, DecisionCommitter) {
    let conn = Connection::open_in_memory().unwrap();
    configure_sqlite_connection(&conn).unwrap();
    init_schema(&conn).unwrap();
    let repos = DockRepositories::from_connection(Arc::new(Mutex::new(conn)));

    repos.door_repo.upsert(&Door::new("FRE-D01", "FRE", true)).unwrap();
    repos.door_repo.upsert(&Door::new("FRE-D02", "FRE", true)).unwrap();

    let slots: Vec<ResourceCalendarSlot> = (0..16)
        .map(|i| {
            let start = t(8, 0) + Duration::minutes(15 * i);
            ResourceCalendarSlot {
                location: "FRE".to_string(),
                slot_start: start,
                slot_end: start + Duration::minutes(15),
                crews: 3,
                forklifts: 3,
            }
        })
        .collect();
    repos.calendar_repo.batch_insert(&slots).unwrap();

    let committer = DecisionCommitter::new(
        repos.clone(),
        &AllocatorConfig::default(),
        Arc::new(LocationLocks::new()),
    );
    (repos, committer)
}

fn proposal(ref_id: &str, door: &str, start: NaiveDateTime, minutes: i64, priority: i64) -> Proposal {
    Proposal {
        proposal_id: format!("prop-{}", ref_id),
        task_id: format!("task-{}", ref_id),
        job_kind: JobKind::Inbound,
        ref_id: ref_id.to_string(),
        location: "FRE".to_string(),
        door_id: door.to_string(),
        start,
        end: start + Duration::minutes(minutes),
        local_cost: -5 * priority,
        wait_min: 0,
        lateness_min: 0,
        priority,
        earliest_ready: start,
        strategy: AllocationStrategy::Heuristic,
        feasibility: Feasibility::default(),
    }
}

fn commit(committer: &DecisionCommitter, proposals: Vec<Proposal>) -> Decision {
    committer
        .commit_batch(proposals, "dec-test".to_string(), vec!["heuristic_commit".to_string()], t(7, 55))
        .unwrap()
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_accepted_proposal_writes_assignment_and_event() {
    let (repos, committer) = setup();
    let mut p = proposal("T-001", "FRE-D01", t(8, 0), 30, 1);
    p.strategy = AllocationStrategy::Solver;

    let decision = commit(&committer, vec![p]);
    assert_eq!(decision.accepted.len(), 1);
    assert_eq!(decision.confidence, 1.0);

    let assignment_id = &decision.accepted[0].assignment_id;
    assert!(assignment_id.starts_with("asg-"));
    let stored = repos.assignment_repo.find_by_id(assignment_id).unwrap().unwrap();
    assert_eq!(stored.status, AssignmentStatus::Scheduled);
    assert_eq!(stored.crew_label, "auto");
    assert_eq!(stored.created_at, t(7, 55));

    let events = repos.event_repo.list_by_door("FRE-D01", 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason_code(), ReasonCode::SolverChoice);
}

#[test]
fn test_double_booking_is_rejected_and_penalty_accumulates() {
    let (_repos, committer) = setup();
    let decision = commit(
        &committer,
        vec![
            proposal("T-001", "FRE-D01", t(8, 0), 30, 1),
            proposal("T-002", "FRE-D01", t(8, 15), 30, 1),
            proposal("T-003", "FRE-D02", t(8, 0), 30, 1),
        ],
    );

    assert_eq!(decision.accepted.len(), 2);
    assert_eq!(decision.rejections.len(), 1);
    assert_eq!(decision.rejections[0].ref_id, "T-002");
    assert_eq!(decision.rejections[0].confidence, 0.0);
    assert_eq!(decision.rejections[0].reason.code(), "double_booking");

    // 第二个被接受的提案承担一次拒绝惩罚
    assert!((decision.accepted[1].confidence - 0.9).abs() < 1e-9);
    assert!((decision.confidence - 0.95).abs() < 1e-9);
}

#[test]
fn test_touching_proposals_both_accepted() {
    let (_repos, committer) = setup();
    let decision = commit(
        &committer,
        vec![
            proposal("T-001", "FRE-D01", t(8, 0), 30, 1),
            proposal("T-002", "FRE-D01", t(8, 30), 30, 1),
        ],
    );
    assert_eq!(decision.accepted.len(), 2);
    assert!(decision.rejections.is_empty());
}

#[test]
fn test_empty_batch_has_zero_confidence() {
    let (_repos, committer) = setup();
    let decision = commit(&committer, Vec::new());
    assert!(decision.accepted.is_empty());
    assert_eq!(decision.confidence, 0.0);
}

#[test]
fn test_evaluate_low_confidence() {
    let (_repos, committer) = setup();
    let mut p = proposal("L-001", "FRE-D01", t(8, 0), 30, 0);
    p.lateness_min = 90;
    p.local_cost = 180;

    let snapshot = committer.load_snapshot(&p).unwrap();
    match committer.evaluate(&p, &snapshot, 0.0) {
        Evaluation::Rejected {
            reason: RejectionReason::LowConfidence { threshold, .. },
            confidence,
        } => {
            assert_eq!(threshold, 0.6);
            assert!((confidence - 0.4).abs() < 1e-9);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_outside_calendar_is_rejected() {
    let (_repos, committer) = setup();
    let decision = commit(&committer, vec![proposal("T-001", "FRE-D01", t(13, 0), 30, 1)]);
    match &decision.rejections[0].reason {
        RejectionReason::Validation { failure } => {
            assert_eq!(
                *failure,
                ValidationFailure::NoResourceCalendar {
                    location: "FRE".to_string()
                }
            )
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_reassignment_with_higher_priority() {
    let (repos, committer) = setup();
    let first = commit(&committer, vec![proposal("T-LOW", "FRE-D01", t(9, 0), 30, 1)]);
    let displaced_id = first.accepted[0].assignment_id.clone();

    let decision = committer
        .commit_reassignment(
            proposal("T-HIGH", "FRE-D01", t(9, 0), 30, 4),
            &displaced_id,
            "dec-re".to_string(),
            t(8, 30),
        )
        .unwrap();

    assert_eq!(decision.accepted.len(), 1);
    assert_eq!(decision.why, vec!["heuristic_commit", "priority_change"]);

    let displaced = repos.assignment_repo.find_by_id(&displaced_id).unwrap().unwrap();
    assert_eq!(displaced.status, AssignmentStatus::Reassigned);

    let events = repos.event_repo.list_by_ref("T-LOW").unwrap();
    let reassigned = events
        .iter()
        .find(|e| e.event_type == DockEventType::Reassigned)
        .unwrap();
    match &reassigned.reason_detail {
        ReasonDetail::PriorityChange { priority_delta, .. } => assert_eq!(*priority_delta, 3),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_reassignment_rejection_leaves_state() {
    let (repos, committer) = setup();
    let first = commit(&committer, vec![proposal("T-OLD", "FRE-D01", t(9, 0), 30, 1)]);
    let displaced_id = first.accepted[0].assignment_id.clone();

    let mut late = proposal("T-NEW", "FRE-D01", t(9, 0), 30, 0);
    late.lateness_min = 120;
    late.local_cost = 240;
    let decision = committer
        .commit_reassignment(late, &displaced_id, "dec-re2".to_string(), t(8, 30))
        .unwrap();
    assert!(decision.accepted.is_empty());
    assert_eq!(decision.rejections[0].reason.code(), "low_confidence");

    let displaced = repos.assignment_repo.find_by_id(&displaced_id).unwrap().unwrap();
    assert_eq!(displaced.status, AssignmentStatus::Scheduled);
}

#[test]
fn test_reassignment_preconditions() {
    let (repos, committer) = setup();
    let first = commit(&committer, vec![proposal("T-OLD", "FRE-D01", t(9, 0), 30, 1)]);
    let displaced_id = first.accepted[0].assignment_id.clone();

    let err = committer
        .commit_reassignment(
            proposal("T-NEW", "FRE-D02", t(9, 0), 30, 3),
            &displaced_id,
            "dec".to_string(),
            t(8, 30),
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::BusinessRuleViolation(_)));

    let err = committer
        .commit_reassignment(
            proposal("T-NEW", "FRE-D01", t(9, 0), 30, 3),
            "asg-missing",
            "dec".to_string(),
            t(8, 30),
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    repos
        .assignment_repo
        .transition_status(&displaced_id, AssignmentStatus::InProgress, None)
        .unwrap();
    let err = committer
        .commit_reassignment(
            proposal("T-NEW", "FRE-D01", t(9, 0), 30, 3),
            &displaced_id,
            "dec".to_string(),
            t(8, 30),
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));
}
