// ==========================================
// 批量优化 - 离散化模型
// ==========================================
// 决策变量: (作业, 门, 开始时间片)
// 时间片: [now + t*slot, now + (t+1)*slot)
// ==========================================

use crate::domain::job::JobRequest;
use crate::domain::time_window::{minutes_between, TimeWindow};
use crate::engine::free_window::FreeWindows;
use crate::engine::greedy::{lateness_min, local_cost};
use chrono::{Duration, NaiveDateTime};

// ==========================================
// SlotMask - 单门时间片占用位图
// ==========================================
#[derive(Debug, Clone)]
pub(super) struct SlotMask {
    bits: Vec<u64>,
}

impl SlotMask {
    pub(super) fn new(slots: usize) -> Self {
        Self {
            bits: vec![0; slots.div_ceil(64).max(1)],
        }
    }

    fn get(&self, slot: usize) -> bool {
        self.bits[slot / 64] & (1u64 << (slot % 64)) != 0
    }

    pub(super) fn is_free(&self, start: usize, len: usize) -> bool {
        (start..start + len).all(|s| !self.get(s))
    }

    pub(super) fn set(&mut self, start: usize, len: usize) {
        for s in start..start + len {
            self.bits[s / 64] |= 1u64 << (s % 64);
        }
    }

    pub(super) fn clear(&mut self, start: usize, len: usize) {
        for s in start..start + len {
            self.bits[s / 64] &= !(1u64 << (s % 64));
        }
    }
}

/// 单个候选位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Candidate {
    pub door_idx: usize,
    pub start_slot: usize,
    pub slots: usize,
    pub window: TimeWindow,
    pub wait_min: i64,
    pub lateness_min: i64,
    pub cost: i64,
}

/// 单个作业的候选集（按 成本、门序、时间片 升序）
#[derive(Debug, Clone)]
pub(super) struct JobModel {
    pub job_idx: usize,
    pub candidates: Vec<Candidate>,
}

impl JobModel {
    /// 候选中的最低成本（候选为空时无意义）
    pub fn best_cost(&self) -> i64 {
        self.candidates.first().map(|c| c.cost).unwrap_or(0)
    }
}

// ==========================================
// BatchModel - 批量优化模型
// ==========================================
#[derive(Debug, Clone)]
pub(super) struct BatchModel {
    pub door_ids: Vec<String>,
    pub horizon_slots: usize,
    /// 有候选的作业，按最低成本升序（同成本按输入顺序）
    pub jobs: Vec<JobModel>,
    /// 没有任何候选的作业（输入下标）
    pub infeasible: Vec<usize>,
}

impl BatchModel {
    pub(super) fn build(
        jobs: &[JobRequest],
        free: &FreeWindows,
        now: NaiveDateTime,
        horizon_min: i64,
        slot_min: i64,
    ) -> Self {
        let door_ids: Vec<String> = free.keys().cloned().collect();
        let horizon_slots = if slot_min > 0 {
            (horizon_min / slot_min).max(0) as usize
        } else {
            0
        };

        let mut models = Vec::with_capacity(jobs.len());
        let mut infeasible = Vec::new();

        for (job_idx, job) in jobs.iter().enumerate() {
            let candidates = Self::candidates_for(job, free, now, horizon_slots, slot_min);
            if candidates.is_empty() {
                infeasible.push(job_idx);
            } else {
                models.push(JobModel { job_idx, candidates });
            }
        }

        models.sort_by_key(|m| (m.best_cost(), m.job_idx));

        Self {
            door_ids,
            horizon_slots,
            jobs: models,
            infeasible,
        }
    }

    fn candidates_for(
        job: &JobRequest,
        free: &FreeWindows,
        now: NaiveDateTime,
        horizon_slots: usize,
        slot_min: i64,
    ) -> Vec<Candidate> {
        if job.duration_min <= 0 || slot_min <= 0 {
            return Vec::new();
        }

        let slot_secs = slot_min * 60;
        let slots = ((job.duration_min + slot_min - 1) / slot_min) as usize;
        if slots > horizon_slots {
            return Vec::new();
        }

        // 向上取整: 开始时间不早于最早就绪
        let offset_secs = (job.earliest_ready - now).num_seconds().max(0);
        let earliest_slot = ((offset_secs + slot_secs - 1) / slot_secs) as usize;

        let mut out = Vec::new();
        for (door_idx, windows) in free.values().enumerate() {
            for t in earliest_slot..=(horizon_slots - slots) {
                let start = now + Duration::minutes(t as i64 * slot_min);
                let window = TimeWindow::new(start, job.finish_at(start));
                if !windows.iter().any(|w| w.contains(&window)) {
                    continue;
                }

                let wait = minutes_between(job.earliest_ready, start);
                let late = lateness_min(window.end, job.deadline);
                let cost = local_cost(wait, late, job.priority);
                // 正成本不会比不分配更优
                if cost > 0 {
                    continue;
                }

                out.push(Candidate {
                    door_idx,
                    start_slot: t,
                    slots,
                    window,
                    wait_min: wait,
                    lateness_min: late,
                    cost,
                });
            }
        }

        out.sort_by_key(|c| (c.cost, c.door_idx, c.start_slot));
        out
    }
}
