// ==========================================
// 装卸月台门分配系统 - 门分配 API
// ==========================================
// 职责: 单作业提案、提案提交、批量优化提交、改派
// 红线: 只读步骤不加锁；校验与落库统一走 DecisionCommitter（站点锁内）
// ==========================================

mod execution;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::request_validator;
use crate::config::{AllocatorConfig, ConfigManager};
use crate::domain::job::{InboundSlotRequest, JobRequest, OutboundSlotRequest};
use crate::domain::proposal::{Decision, Feasibility, Proposal};
use crate::domain::time_window::{truncate_to_second, TimeWindow};
use crate::domain::types::{new_id, AllocationStrategy};
use crate::engine::{
    BatchOptimizer, DecisionCommitter, DockRepositories, FreeWindowCalculator, FreeWindows,
    GreedyAllocator, LocationLocks,
};
use crate::perf::PerfGuard;

/// 时间基准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// 系统 UTC 时间（截断到秒）
    System,
    /// 固定时刻（测试 / 回放）
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => truncate_to_second(Utc::now().naive_utc()),
            Clock::Fixed(ts) => *ts,
        }
    }
}

/// 候选位置 → 提案所需的落位信息
struct PlacementInfo<'a> {
    door_id: &'a str,
    window: TimeWindow,
    wait_min: i64,
    lateness_min: i64,
    cost: i64,
}

fn build_proposal(
    job: &JobRequest,
    task_id: &str,
    placement: PlacementInfo<'_>,
    strategy: AllocationStrategy,
) -> Proposal {
    Proposal {
        proposal_id: new_id("prop"),
        task_id: task_id.to_string(),
        job_kind: job.kind,
        ref_id: job.job_id.clone(),
        location: job.location.clone(),
        door_id: placement.door_id.to_string(),
        start: placement.window.start,
        end: placement.window.end,
        local_cost: placement.cost,
        wait_min: placement.wait_min,
        lateness_min: placement.lateness_min,
        priority: job.priority,
        earliest_ready: job.earliest_ready,
        strategy,
        feasibility: Feasibility::default(),
    }
}

// ==========================================
// DockApi - 门分配 API
// ==========================================

/// 门分配API
///
/// 职责：
/// 1. 单作业提案（入库 / 出库）
/// 2. 提案批量提交
/// 3. 站点批量优化并提交
/// 4. 改派与执行跟踪
pub struct DockApi {
    repos: DockRepositories,
    config: AllocatorConfig,
    locks: Arc<LocationLocks>,
    committer: DecisionCommitter,
    greedy: GreedyAllocator,
    optimizer: BatchOptimizer,
    free_windows: FreeWindowCalculator,
    clock: Clock,
}

impl DockApi {
    /// 创建 DockApi
    ///
    /// # 返回
    /// - Err(ConfigError): 参数非法
    pub fn new(
        repos: DockRepositories,
        config: AllocatorConfig,
        locks: Arc<LocationLocks>,
    ) -> ApiResult<Self> {
        config.validate()?;
        Ok(Self {
            committer: DecisionCommitter::new(repos.clone(), &config, locks.clone()),
            greedy: GreedyAllocator::new(config.default_max_wait_min),
            optimizer: BatchOptimizer::from_config(&config),
            free_windows: FreeWindowCalculator::new(),
            repos,
            config,
            locks,
            clock: Clock::System,
        })
    }

    /// 基于共享连接构建，参数从 config_kv 读取
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone()).load_allocator_config()?;
        Self::new(
            DockRepositories::from_connection(conn),
            config,
            Arc::new(LocationLocks::new()),
        )
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub fn repositories(&self) -> &DockRepositories {
        &self.repos
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// 站点视野内的空闲窗口（只读，不加锁）
    fn load_free_windows(&self, location: &str, now: NaiveDateTime) -> ApiResult<FreeWindows> {
        let doors = self.repos.door_repo.list_active(location)?;
        let horizon = TimeWindow::from_start(now, self.config.horizon_min);
        let spans = self.repos.assignment_repo.find_active_in_range(location, &horizon)?;
        Ok(self
            .free_windows
            .compute(&doors, now, self.config.horizon_min, &spans))
    }

    fn propose_job(&self, job: &JobRequest, task_id: &str, now: NaiveDateTime) -> ApiResult<Option<Proposal>> {
        let free = self.load_free_windows(&job.location, now)?;
        let proposal = self.greedy.allocate(job, &free).map(|p| {
            build_proposal(
                job,
                task_id,
                PlacementInfo {
                    door_id: &p.door_id,
                    window: p.window,
                    wait_min: p.wait_min,
                    lateness_min: p.lateness_min,
                    cost: p.cost,
                },
                AllocationStrategy::Heuristic,
            )
        });

        match &proposal {
            Some(p) => info!(
                job_id = %job.job_id,
                door_id = %p.door_id,
                start = %p.start,
                local_cost = p.local_cost,
                "生成提案"
            ),
            None => info!(job_id = %job.job_id, "无可行门位"),
        }
        Ok(proposal)
    }

    // ==========================================
    // 单作业提案
    // ==========================================

    /// 入库卸车提案
    ///
    /// # 返回
    /// - Ok(None): 视野内无满足最大等待的门位
    #[instrument(skip(self, req), fields(location = %req.location, truck_id = %req.truck_id))]
    pub fn propose_inbound(&self, req: &InboundSlotRequest) -> ApiResult<Option<Proposal>> {
        let _perf = PerfGuard::new("dock.propose_inbound").with_location(&req.location);
        request_validator::validate_inbound(req)?;
        self.propose_job(&req.to_job_request(), &req.task_id, self.now())
    }

    /// 出库装车提案（最早就绪取当前时刻，截止为 cutoff）
    #[instrument(skip(self, req), fields(location = %req.location, load_id = %req.load_id))]
    pub fn propose_outbound(&self, req: &OutboundSlotRequest) -> ApiResult<Option<Proposal>> {
        let _perf = PerfGuard::new("dock.propose_outbound").with_location(&req.location);
        request_validator::validate_outbound(req)?;
        let now = self.now();
        self.propose_job(&req.to_job_request(now), &req.task_id, now)
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 校验并提交一组提案
    ///
    /// why 为提案策略对应的提交标签（按首次出现去重），空批次取 heuristic_commit
    #[instrument(skip(self, proposals), fields(count = proposals.len()))]
    pub fn decide_and_commit(&self, proposals: Vec<Proposal>) -> ApiResult<Decision> {
        let _perf = PerfGuard::new("dock.decide_and_commit").with_items(proposals.len());
        for proposal in &proposals {
            request_validator::validate_proposal(proposal)?;
        }

        let mut why: Vec<String> = Vec::new();
        for proposal in &proposals {
            let tag = proposal.strategy.commit_tag();
            if !why.iter().any(|w| w == tag) {
                why.push(tag.to_string());
            }
        }
        if why.is_empty() {
            why.push(AllocationStrategy::Heuristic.commit_tag().to_string());
        }

        let decision = self
            .committer
            .commit_batch(proposals, new_id("dec"), why, self.now())?;
        info!(
            decision_id = %decision.decision_id,
            accepted = decision.accepted.len(),
            rejected = decision.rejections.len(),
            confidence = decision.confidence,
            "决策已提交"
        );
        Ok(decision)
    }

    /// 站点批量优化并提交
    ///
    /// 站点无启用门时返回 why=["no_doors"] 的空决策；
    /// 优化器未落位的作业记入 `unassigned`
    #[instrument(skip(self, jobs), fields(location = %location, jobs = jobs.len()))]
    pub fn optimize_batch_and_commit(&self, jobs: &[JobRequest], location: &str) -> ApiResult<Decision> {
        let _perf = PerfGuard::new("dock.optimize_batch_and_commit")
            .with_location(location)
            .with_items(jobs.len());
        request_validator::validate_batch(jobs, location)?;
        let jobs: Vec<JobRequest> = jobs.iter().map(JobRequest::truncated_to_second).collect();
        let jobs = jobs.as_slice();

        let now = self.now();
        let decision_id = new_id("dec");
        let free = self.load_free_windows(location, now)?;

        if free.is_empty() {
            warn!(location, "站点无启用门");
            let mut decision = Decision::empty(decision_id, vec!["no_doors".to_string()]);
            decision.unassigned = jobs.iter().map(|j| j.job_id.clone()).collect();
            return Ok(decision);
        }

        let solution = self.optimizer.optimize(jobs, &free, now);

        let by_id: HashMap<&str, &JobRequest> = jobs.iter().map(|j| (j.job_id.as_str(), j)).collect();
        let mut proposals = Vec::with_capacity(solution.placements.len());
        for placement in &solution.placements {
            let job = by_id.get(placement.job_id.as_str()).ok_or_else(|| {
                ApiError::InternalError(format!("优化结果包含未知作业: {}", placement.job_id))
            })?;
            proposals.push(build_proposal(
                job,
                &decision_id,
                PlacementInfo {
                    door_id: &placement.door_id,
                    window: placement.window,
                    wait_min: placement.wait_min,
                    lateness_min: placement.lateness_min,
                    cost: placement.cost,
                },
                AllocationStrategy::Solver,
            ));
        }

        let why = vec![AllocationStrategy::Solver.commit_tag().to_string()];
        let mut decision = self.committer.commit_batch(proposals, decision_id, why, now)?;
        decision.unassigned = solution.unassigned;

        info!(
            decision_id = %decision.decision_id,
            accepted = decision.accepted.len(),
            rejected = decision.rejections.len(),
            unassigned = decision.unassigned.len(),
            status = ?solution.status,
            total_cost = solution.total_cost,
            "批量决策已提交"
        );
        Ok(decision)
    }

    /// 改派: 用新提案替换同门重叠时段的 scheduled 分配
    ///
    /// # 返回
    /// - Ok(Decision): 接受时 why = [提交标签, 改派原因码]；拒绝时状态不变
    /// - Err(NotFound / InvalidStateTransition / BusinessRuleViolation)
    #[instrument(skip(self, proposal), fields(proposal_id = %proposal.proposal_id))]
    pub fn reassign_and_commit(&self, proposal: Proposal, displaced_assignment_id: &str) -> ApiResult<Decision> {
        let _perf = PerfGuard::new("dock.reassign_and_commit").with_location(&proposal.location);
        request_validator::validate_proposal(&proposal)?;
        let decision = self.committer.commit_reassignment(
            proposal,
            displaced_assignment_id,
            new_id("dec"),
            self.now(),
        )?;
        Ok(decision)
    }
}
