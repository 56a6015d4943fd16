use super::*;
use crate::domain::assignment::OccupiedSpan;
use crate::domain::door::Door;
use crate::domain::types::{AssignmentStatus, JobKind};
use crate::engine::free_window::FreeWindowCalculator;
use chrono::NaiveDate;

// ==========================================
// 测试辅助函数
// ==========================================

fn t(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn job(id: &str, earliest: NaiveDateTime, duration: i64, priority: i64) -> JobRequest {
    JobRequest {
        job_id: id.to_string(),
        kind: JobKind::Inbound,
        location: "FRE".to_string(),
        earliest_ready: earliest,
        deadline: None,
        duration_min: duration,
        priority,
        max_wait_min: None,
    }
}

fn site(door_count: usize, spans: &[OccupiedSpan]) -> FreeWindows {
    let doors: Vec<Door> = (1..=door_count)
        .map(|i| Door::new(format!("FRE-D{:02}", i), "FRE", true))
        .collect();
    FreeWindowCalculator::new().compute(&doors, t(8, 0), 240, spans)
}

fn optimizer() -> BatchOptimizer {
    BatchOptimizer::new(240, 5, Duration::from_millis(1800))
}

fn assert_no_overlap(solution: &BatchSolution) {
    for (i, a) in solution.placements.iter().enumerate() {
        for b in solution.placements.iter().skip(i + 1) {
            if a.door_id == b.door_id {
                assert!(!a.window.overlaps(&b.window), "{} / {} 重叠", a.job_id, b.job_id);
            }
        }
    }
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_urgent_job_with_early_deadline_is_not_late() {
    let mut urgent = job("URGENT", t(8, 0), 30, 9);
    urgent.deadline = Some(t(8, 30));

    let jobs = vec![
        job("J1", t(8, 0), 30, 7),
        job("J2", t(8, 0), 30, 7),
        urgent,
        job("J3", t(8, 0), 30, 7),
        job("J4", t(8, 0), 30, 7),
    ];

    let solution = optimizer().optimize(&jobs, &site(3, &[]), t(8, 0));

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.placements.len(), 5);

    let p = solution
        .placements
        .iter()
        .find(|p| p.job_id == "URGENT")
        .unwrap();
    assert_eq!(p.lateness_min, 0);
    assert_eq!(p.window.start, t(8, 0));

    // -45 + 2*(-35) + 2*(30-35)
    assert_eq!(solution.total_cost, -125);
    assert_eq!(
        solution.total_cost,
        solution.placements.iter().map(|p| p.cost).sum::<i64>()
    );
    assert_no_overlap(&solution);
}

#[test]
fn test_placements_follow_input_order() {
    let jobs = vec![job("B", t(8, 0), 20, 1), job("A", t(8, 0), 20, 2)];
    let solution = optimizer().optimize(&jobs, &site(2, &[]), t(8, 0));
    let ids: Vec<_> = solution.placements.iter().map(|p| p.job_id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A"]);
}

#[test]
fn test_start_rounds_up_to_earliest_slot() {
    let jobs = vec![job("J1", t(8, 3), 10, 1)];
    let solution = optimizer().optimize(&jobs, &site(1, &[]), t(8, 0));

    let p = &solution.placements[0];
    assert_eq!(p.window.start, t(8, 5));
    assert_eq!(p.window.end, t(8, 15));
    assert_eq!(p.wait_min, 2);
    assert_eq!(p.cost, -3);
}

#[test]
fn test_finish_beyond_horizon_is_unassigned() {
    let opt = BatchOptimizer::new(60, 5, Duration::from_millis(1800));
    let doors = vec![Door::new("D1", "FRE", true)];
    let free = FreeWindowCalculator::new().compute(&doors, t(8, 0), 60, &[]);

    let jobs = vec![job("LONG", t(8, 5), 60, 10)];
    let solution = opt.optimize(&jobs, &free, t(8, 0));

    assert!(solution.placements.is_empty());
    assert_eq!(solution.unassigned, vec!["LONG".to_string()]);
    assert_eq!(solution.total_cost, 0);
}

#[test]
fn test_committed_assignment_is_respected() {
    let spans = vec![OccupiedSpan {
        assignment_id: "asg-existing".to_string(),
        door_id: "FRE-D01".to_string(),
        window: TimeWindow::new(t(8, 0), t(8, 30)),
        status: AssignmentStatus::Scheduled,
    }];
    let jobs = vec![job("J1", t(8, 0), 30, 10)];
    let solution = optimizer().optimize(&jobs, &site(1, &spans), t(8, 0));

    let p = &solution.placements[0];
    assert_eq!(p.window.start, t(8, 30));
    assert_eq!(p.wait_min, 30);
}

#[test]
fn test_positive_cost_job_stays_unassigned() {
    let spans = vec![OccupiedSpan {
        assignment_id: "asg-existing".to_string(),
        door_id: "FRE-D01".to_string(),
        window: TimeWindow::new(t(8, 0), t(8, 30)),
        status: AssignmentStatus::InProgress,
    }];
    // 最早可开始 8:30，等待 30，优先级 0 → 成本 30 > 0
    let jobs = vec![job("SLOW", t(8, 0), 20, 0)];
    let solution = optimizer().optimize(&jobs, &site(1, &spans), t(8, 0));

    assert!(solution.placements.is_empty());
    assert_eq!(solution.unassigned, vec!["SLOW".to_string()]);
}

#[test]
fn test_zero_cost_job_is_still_assigned() {
    let jobs = vec![job("ZERO", t(8, 0), 20, 0)];
    let solution = optimizer().optimize(&jobs, &site(1, &[]), t(8, 0));

    assert_eq!(solution.placements.len(), 1);
    assert_eq!(solution.total_cost, 0);
}

#[test]
fn test_batch_jobs_share_single_door_without_overlap() {
    let jobs = vec![
        job("J1", t(8, 0), 15, 7),
        job("J2", t(8, 0), 15, 7),
        job("J3", t(8, 0), 15, 7),
    ];
    let solution = optimizer().optimize(&jobs, &site(1, &[]), t(8, 0));

    assert_eq!(solution.placements.len(), 3);
    assert_no_overlap(&solution);
    // 等待 0 + 15 + 30，优先级 3 * -35
    assert_eq!(solution.total_cost, -60);
}

#[test]
fn test_rerun_gives_same_total_cost() {
    let jobs: Vec<JobRequest> = (0..6)
        .map(|i| job(&format!("J{}", i), t(8, (i * 5) as u32), 25, 3 + i as i64 % 3))
        .collect();
    let free = site(2, &[]);

    let first = optimizer().optimize(&jobs, &free, t(8, 0));
    let second = optimizer().optimize(&jobs, &free, t(8, 0));

    assert_eq!(first.status, SolveStatus::Optimal);
    assert_eq!(first.total_cost, second.total_cost);
    assert_eq!(first.placements, second.placements);
}

#[test]
fn test_zero_budget_still_returns_valid_solution() {
    let opt = BatchOptimizer::new(240, 5, Duration::ZERO);
    let jobs: Vec<JobRequest> = (0..12)
        .map(|i| job(&format!("J{}", i), t(8, 0), 20, 4))
        .collect();
    let solution = opt.optimize(&jobs, &site(2, &[]), t(8, 0));

    assert_no_overlap(&solution);
    assert_eq!(solution.placements.len() + solution.unassigned.len(), 12);
    assert!(solution.total_cost <= 0);
    for p in &solution.placements {
        assert!(p.window.start >= t(8, 0));
        assert!(p.window.end <= t(12, 0));
    }
}

#[test]
fn test_no_doors_leaves_everything_unassigned() {
    let jobs = vec![job("J1", t(8, 0), 20, 4)];
    let solution = optimizer().optimize(&jobs, &FreeWindows::new(), t(8, 0));
    assert_eq!(solution.unassigned, vec!["J1".to_string()]);
    assert_eq!(solution.status, SolveStatus::Optimal);
}
