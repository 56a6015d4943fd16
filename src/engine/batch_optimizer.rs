// ==========================================
// 装卸月台门分配系统 - 批量优化器
// ==========================================
// 职责: 一个站点一批作业的联合排门
// 约束:
// - 每个作业最多分配一次（允许不分配）
// - 同门同时间片最多一个作业
// - 开始时间不早于最早就绪，结束不超出视野
// - 不与已提交占用重叠（必须完整落在空闲窗口内）
// 目标: min Σ (wait + 2*lateness - 5*priority)
// 红线: 只读，不写库；超出时间预算返回当前最优解
// ==========================================

mod model;
mod search;

#[cfg(test)]
mod tests;

use crate::config::AllocatorConfig;
use crate::domain::job::JobRequest;
use crate::domain::time_window::TimeWindow;
use crate::engine::free_window::FreeWindows;
use chrono::NaiveDateTime;
use model::BatchModel;
use search::BranchAndBound;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// 求解状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// 搜索完成，结果为最优
    Optimal,
    /// 时间预算耗尽，返回当前最优
    TimeLimit,
}

/// 单个作业的优化结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlacement {
    pub job_id: String,
    pub door_id: String,
    pub window: TimeWindow,
    pub wait_min: i64,
    pub lateness_min: i64,
    pub cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSolution {
    /// 按输入作业顺序
    pub placements: Vec<BatchPlacement>,
    /// 未分配作业ID，按输入顺序
    pub unassigned: Vec<String>,
    pub total_cost: i64,
    pub status: SolveStatus,
    pub nodes_explored: u64,
    pub elapsed_ms: u64,
}

// ==========================================
// BatchOptimizer - 批量优化器
// ==========================================
pub struct BatchOptimizer {
    horizon_min: i64,
    slot_min: i64,
    time_budget: Duration,
}

impl BatchOptimizer {
    pub fn new(horizon_min: i64, slot_min: i64, time_budget: Duration) -> Self {
        Self {
            horizon_min,
            slot_min,
            time_budget,
        }
    }

    pub fn from_config(config: &AllocatorConfig) -> Self {
        Self::new(
            config.horizon_min,
            config.slot_min,
            Duration::from_millis(config.solver_time_budget_ms),
        )
    }

    /// 求解
    ///
    /// # 参数
    /// - `jobs`: 同一站点的作业
    /// - `free`: 该站点启用门的空闲窗口（视野起点须为 `now`）
    /// - `now`: 时间基准（时间片 0 的起点）
    #[instrument(skip(self, jobs, free), fields(jobs = jobs.len(), doors = free.len()))]
    pub fn optimize(&self, jobs: &[JobRequest], free: &FreeWindows, now: NaiveDateTime) -> BatchSolution {
        let started = Instant::now();
        let deadline = started + self.time_budget;

        let model = BatchModel::build(jobs, free, now, self.horizon_min, self.slot_min);
        let outcome = BranchAndBound::new(&model, deadline).run();

        let mut chosen: Vec<Option<BatchPlacement>> = vec![None; jobs.len()];
        for (mi, pick) in outcome.choice.iter().enumerate() {
            let Some(ci) = pick else { continue };
            let job_model = &model.jobs[mi];
            let c = &job_model.candidates[*ci];
            chosen[job_model.job_idx] = Some(BatchPlacement {
                job_id: jobs[job_model.job_idx].job_id.clone(),
                door_id: model.door_ids[c.door_idx].clone(),
                window: c.window,
                wait_min: c.wait_min,
                lateness_min: c.lateness_min,
                cost: c.cost,
            });
        }

        let mut placements = Vec::new();
        let mut unassigned = Vec::new();
        for (idx, slot) in chosen.into_iter().enumerate() {
            match slot {
                Some(p) => placements.push(p),
                None => unassigned.push(jobs[idx].job_id.clone()),
            }
        }

        let status = if outcome.timed_out {
            SolveStatus::TimeLimit
        } else {
            SolveStatus::Optimal
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            placed = placements.len(),
            unassigned = unassigned.len(),
            infeasible = model.infeasible.len(),
            total_cost = outcome.total_cost,
            nodes = outcome.nodes,
            elapsed_ms,
            ?status,
            "批量优化完成"
        );

        BatchSolution {
            placements,
            unassigned,
            total_cost: outcome.total_cost,
            status,
            nodes_explored: outcome.nodes,
            elapsed_ms,
        }
    }
}

impl Default for BatchOptimizer {
    fn default() -> Self {
        Self::from_config(&AllocatorConfig::default())
    }
}
