// ==========================================
// 装卸月台门分配系统 - 请求校验
// ==========================================
// 职责: 调用方输入的形状校验（时长、ID、站点归属、批次去重）
// 红线: 形状问题返回 InvalidInput，不进入引擎
// 上限: 分钟类字段 ≤ MAX_MINUTES，|priority| ≤ MAX_PRIORITY，引擎内成本与时间运算不会溢出
// ==========================================

use std::collections::HashSet;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::job::{InboundSlotRequest, JobRequest, OutboundSlotRequest};
use crate::domain::proposal::Proposal;

/// 时长 / 等待窗口上限（7 天）
pub const MAX_MINUTES: i64 = 7 * 24 * 60;

/// 优先级绝对值上限
pub const MAX_PRIORITY: i64 = 1_000;

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} 不能为空", field)));
    }
    Ok(())
}

fn require_positive(field: &str, value: i64) -> ApiResult<()> {
    if value <= 0 {
        return Err(ApiError::InvalidInput(format!(
            "{} 必须大于 0 (实际: {})",
            field, value
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i64) -> ApiResult<()> {
    if value < 0 {
        return Err(ApiError::InvalidInput(format!(
            "{} 不能为负数 (实际: {})",
            field, value
        )));
    }
    Ok(())
}

fn require_at_most(field: &str, value: i64, max: i64) -> ApiResult<()> {
    if value > max {
        return Err(ApiError::InvalidInput(format!(
            "{} 超出上限 {} (实际: {})",
            field, max, value
        )));
    }
    Ok(())
}

fn require_priority(value: i64) -> ApiResult<()> {
    if value.checked_abs().map_or(true, |abs| abs > MAX_PRIORITY) {
        return Err(ApiError::InvalidInput(format!(
            "priority 超出范围 ±{} (实际: {})",
            MAX_PRIORITY, value
        )));
    }
    Ok(())
}

pub fn validate_inbound(req: &InboundSlotRequest) -> ApiResult<()> {
    require_non_empty("task_id", &req.task_id)?;
    require_non_empty("location", &req.location)?;
    require_non_empty("truck_id", &req.truck_id)?;
    require_positive("unload_min", req.unload_min)?;
    require_at_most("unload_min", req.unload_min, MAX_MINUTES)?;
    require_non_negative("window_min", req.window_min)?;
    require_at_most("window_min", req.window_min, MAX_MINUTES)?;
    require_priority(req.priority)?;
    Ok(())
}

pub fn validate_outbound(req: &OutboundSlotRequest) -> ApiResult<()> {
    require_non_empty("task_id", &req.task_id)?;
    require_non_empty("location", &req.location)?;
    require_non_empty("load_id", &req.load_id)?;
    require_positive("load_min", req.load_min)?;
    require_at_most("load_min", req.load_min, MAX_MINUTES)?;
    require_non_negative("window_min", req.window_min)?;
    require_at_most("window_min", req.window_min, MAX_MINUTES)?;
    require_priority(req.priority)?;
    Ok(())
}

pub fn validate_job(job: &JobRequest) -> ApiResult<()> {
    require_non_empty("job_id", &job.job_id)?;
    require_non_empty("location", &job.location)?;
    require_positive("duration_min", job.duration_min)?;
    require_at_most("duration_min", job.duration_min, MAX_MINUTES)?;
    require_priority(job.priority)?;
    if let Some(max_wait) = job.max_wait_min {
        require_non_negative("max_wait_min", max_wait)?;
        require_at_most("max_wait_min", max_wait, MAX_MINUTES)?;
    }
    Ok(())
}

/// 批量作业: 逐个校验 + 站点归属 + 作业ID去重
pub fn validate_batch(jobs: &[JobRequest], location: &str) -> ApiResult<()> {
    require_non_empty("location", location)?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(jobs.len());
    for job in jobs {
        validate_job(job)?;
        if job.location != location {
            return Err(ApiError::InvalidInput(format!(
                "作业 {} 属于站点 {}，与批次站点 {} 不一致",
                job.job_id, job.location, location
            )));
        }
        if !seen.insert(job.job_id.as_str()) {
            return Err(ApiError::InvalidInput(format!(
                "批次中作业ID重复: {}",
                job.job_id
            )));
        }
    }
    Ok(())
}

/// 调用方直接提交的提案: 区间非空、关键字段齐全
pub fn validate_proposal(proposal: &Proposal) -> ApiResult<()> {
    require_non_empty("proposal_id", &proposal.proposal_id)?;
    require_non_empty("ref_id", &proposal.ref_id)?;
    require_non_empty("location", &proposal.location)?;
    require_non_empty("door_id", &proposal.door_id)?;
    require_priority(proposal.priority)?;
    if proposal.end <= proposal.start {
        return Err(ApiError::InvalidInput(format!(
            "提案 {} 的结束时间必须晚于开始时间",
            proposal.proposal_id
        )));
    }
    Ok(())
}
