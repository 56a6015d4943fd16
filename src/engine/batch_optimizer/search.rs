// ==========================================
// 批量优化 - 分支定界搜索
// ==========================================
// 目标: 总成本最小；同成本时分配作业数更多者优先
// 初始解: 贪心（每个作业取第一个仍可放下的候选）
// 下界: 剩余作业最低成本之和（候选成本均 <= 0）
// ==========================================

use super::model::{BatchModel, SlotMask};
use std::time::Instant;

/// 每隔多少个节点检查一次时间预算
const DEADLINE_CHECK_INTERVAL: u64 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Score {
    cost: i64,
    assigned: usize,
}

impl Score {
    fn better_than(&self, other: &Score) -> bool {
        self.cost < other.cost || (self.cost == other.cost && self.assigned > other.assigned)
    }
}

/// 搜索结果: choice[i] 为 model.jobs[i] 选中的候选下标
#[derive(Debug, Clone)]
pub(super) struct SearchOutcome {
    pub choice: Vec<Option<usize>>,
    pub total_cost: i64,
    pub timed_out: bool,
    pub nodes: u64,
}

pub(super) struct BranchAndBound<'a> {
    model: &'a BatchModel,
    masks: Vec<SlotMask>,
    suffix_lb: Vec<i64>,
    current: Vec<Option<usize>>,
    current_score: Score,
    best: Vec<Option<usize>>,
    best_score: Score,
    deadline: Instant,
    nodes: u64,
    timed_out: bool,
}

impl<'a> BranchAndBound<'a> {
    pub(super) fn new(model: &'a BatchModel, deadline: Instant) -> Self {
        let n = model.jobs.len();

        let mut suffix_lb = vec![0i64; n + 1];
        for i in (0..n).rev() {
            suffix_lb[i] = suffix_lb[i + 1] + model.jobs[i].best_cost().min(0);
        }

        Self {
            model,
            masks: vec![SlotMask::new(model.horizon_slots); model.door_ids.len()],
            suffix_lb,
            current: vec![None; n],
            current_score: Score { cost: 0, assigned: 0 },
            best: vec![None; n],
            best_score: Score { cost: 0, assigned: 0 },
            deadline,
            nodes: 0,
            timed_out: false,
        }
    }

    /// 贪心初始解
    fn seed_incumbent(&mut self) {
        let mut masks = self.masks.clone();
        let mut score = Score { cost: 0, assigned: 0 };

        for (i, job) in self.model.jobs.iter().enumerate() {
            let pick = job
                .candidates
                .iter()
                .position(|c| masks[c.door_idx].is_free(c.start_slot, c.slots));
            if let Some(ci) = pick {
                let c = &job.candidates[ci];
                masks[c.door_idx].set(c.start_slot, c.slots);
                score.cost += c.cost;
                score.assigned += 1;
                self.best[i] = Some(ci);
            }
        }
        self.best_score = score;
    }

    pub(super) fn run(mut self) -> SearchOutcome {
        self.seed_incumbent();
        self.dfs(0);

        SearchOutcome {
            choice: self.best,
            total_cost: self.best_score.cost,
            timed_out: self.timed_out,
            nodes: self.nodes,
        }
    }

    fn dfs(&mut self, i: usize) {
        if self.timed_out {
            return;
        }
        self.nodes += 1;
        if self.nodes % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        let n = self.model.jobs.len();
        if i == n {
            if self.current_score.better_than(&self.best_score) {
                self.best_score = self.current_score;
                self.best = self.current.clone();
            }
            return;
        }

        // 剪枝: 最乐观情况下也无法超过当前最优
        let optimistic = Score {
            cost: self.current_score.cost + self.suffix_lb[i],
            assigned: self.current_score.assigned + (n - i),
        };
        if !optimistic.better_than(&self.best_score) {
            return;
        }

        let model = self.model;
        for (ci, c) in model.jobs[i].candidates.iter().enumerate() {
            // 候选按成本升序，后续只会更差
            if self.current_score.cost + c.cost + self.suffix_lb[i + 1] > self.best_score.cost {
                break;
            }
            if !self.masks[c.door_idx].is_free(c.start_slot, c.slots) {
                continue;
            }

            self.masks[c.door_idx].set(c.start_slot, c.slots);
            self.current[i] = Some(ci);
            self.current_score.cost += c.cost;
            self.current_score.assigned += 1;

            self.dfs(i + 1);

            self.current_score.assigned -= 1;
            self.current_score.cost -= c.cost;
            self.current[i] = None;
            self.masks[c.door_idx].clear(c.start_slot, c.slots);

            if self.timed_out {
                return;
            }
        }

        // 不分配该作业
        self.dfs(i + 1);
    }
}
