// ==========================================
// 装卸月台门分配系统 - 单作业启发式分配
// ==========================================
// 成本: wait + 2*lateness - 5*priority（越小越好）
// 平局: 门ID升序、窗口开始时间升序，先找到者保留
// 无可行位置返回 None（值，不是错误）
// ==========================================

use crate::domain::job::JobRequest;
use crate::domain::time_window::{minutes_between, TimeWindow};
use crate::engine::free_window::FreeWindows;
use chrono::NaiveDateTime;
use tracing::{debug, instrument};

/// 局部成本
pub fn local_cost(wait_min: i64, lateness_min: i64, priority: i64) -> i64 {
    wait_min + 2 * lateness_min - 5 * priority
}

/// 延误分钟数: max(0, finish - deadline)，无截止时间为 0
pub fn lateness_min(finish: NaiveDateTime, deadline: Option<NaiveDateTime>) -> i64 {
    match deadline {
        Some(d) => minutes_between(d, finish).max(0),
        None => 0,
    }
}

/// 启发式候选位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub door_id: String,
    pub window: TimeWindow,
    pub wait_min: i64,
    pub lateness_min: i64,
    pub cost: i64,
}

// ==========================================
// GreedyAllocator - 启发式分配器
// ==========================================
pub struct GreedyAllocator {
    default_max_wait_min: i64,
}

impl GreedyAllocator {
    /// # 参数
    /// - `default_max_wait_min`: 作业未指定最大等待时使用
    pub fn new(default_max_wait_min: i64) -> Self {
        Self {
            default_max_wait_min,
        }
    }

    /// 为单个作业挑选最低成本的门与开始时间
    #[instrument(skip(self, job, free), fields(job_id = %job.job_id))]
    pub fn allocate(&self, job: &JobRequest, free: &FreeWindows) -> Option<Placement> {
        let max_wait = job.max_wait_min.unwrap_or(self.default_max_wait_min);
        let mut best: Option<Placement> = None;

        // BTreeMap 迭代即门ID升序
        for (door_id, windows) in free {
            for window in windows {
                let start = window.start.max(job.earliest_ready);
                let end = job.finish_at(start);
                if end > window.end {
                    continue;
                }

                let wait = minutes_between(job.earliest_ready, start);
                if wait > max_wait {
                    continue;
                }

                let late = lateness_min(end, job.deadline);
                let cost = local_cost(wait, late, job.priority);

                let better = match &best {
                    Some(b) => cost < b.cost,
                    None => true,
                };
                if better {
                    best = Some(Placement {
                        door_id: door_id.clone(),
                        window: TimeWindow::new(start, end),
                        wait_min: wait,
                        lateness_min: late,
                        cost,
                    });
                }
            }
        }

        match &best {
            Some(p) => debug!(door_id = %p.door_id, cost = p.cost, "启发式选位"),
            None => debug!("无可行位置"),
        }
        best
    }
}

impl Default for GreedyAllocator {
    fn default() -> Self {
        Self::new(30)
    }
}
