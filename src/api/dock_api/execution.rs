// ==========================================
// DockApi - 执行跟踪与查询
// ==========================================
// 状态机: scheduled → in_progress → completed
//         scheduled/in_progress → cancelled
// ==========================================

use tracing::{info, instrument};

use super::DockApi;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::assignment::Assignment;
use crate::domain::dock_event::{DockEvent, ReasonDetail};
use crate::domain::types::{new_id, AssignmentStatus, DockEventType};
use crate::perf::PerfGuard;

/// 门事件查询默认条数
pub const DEFAULT_EVENT_LIMIT: usize = 200;

impl DockApi {
    fn load_assignment(&self, assignment_id: &str) -> ApiResult<Assignment> {
        self.repos
            .assignment_repo
            .find_by_id(assignment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Assignment(id={})不存在", assignment_id)))
    }

    fn terminal_event(
        &self,
        assignment: &Assignment,
        event_type: DockEventType,
        reason_detail: ReasonDetail,
    ) -> DockEvent {
        DockEvent {
            event_id: new_id("evt"),
            ts: self.now(),
            location: assignment.location.clone(),
            door_id: assignment.door_id.clone(),
            job_kind: Some(assignment.job_kind),
            ref_id: Some(assignment.ref_id.clone()),
            event_type,
            reason_detail,
        }
    }

    /// 开始作业: scheduled → in_progress（不追加事件）
    #[instrument(skip(self))]
    pub fn start_assignment(&self, assignment_id: &str) -> ApiResult<Assignment> {
        let _perf = PerfGuard::new("dock.start_assignment");
        let assignment = self.load_assignment(assignment_id)?;
        let updated = self.locks.run_locked(&assignment.location, || {
            self.repos
                .assignment_repo
                .transition_status(assignment_id, AssignmentStatus::InProgress, None)
        })?;
        info!(assignment_id, door_id = %updated.door_id, "作业开始");
        Ok(updated)
    }

    /// 完成作业: in_progress → completed，追加 normal_completion 事件
    #[instrument(skip(self))]
    pub fn complete_assignment(&self, assignment_id: &str) -> ApiResult<Assignment> {
        let _perf = PerfGuard::new("dock.complete_assignment");
        let assignment = self.load_assignment(assignment_id)?;
        let event = self.terminal_event(
            &assignment,
            DockEventType::Completed,
            ReasonDetail::NormalCompletion {
                assignment_id: assignment.assignment_id.clone(),
                duration_minutes: assignment.window().duration_min(),
            },
        );
        let updated = self.locks.run_locked(&assignment.location, || {
            self.repos
                .assignment_repo
                .transition_status(assignment_id, AssignmentStatus::Completed, Some(&event))
        })?;
        info!(assignment_id, door_id = %updated.door_id, "作业完成");
        Ok(updated)
    }

    /// 取消作业: scheduled/in_progress → cancelled，释放门位
    #[instrument(skip(self, note))]
    pub fn cancel_assignment(&self, assignment_id: &str, note: Option<String>) -> ApiResult<Assignment> {
        let _perf = PerfGuard::new("dock.cancel_assignment");
        let assignment = self.load_assignment(assignment_id)?;
        let event = self.terminal_event(
            &assignment,
            DockEventType::Cancelled,
            ReasonDetail::Cancelled {
                assignment_id: assignment.assignment_id.clone(),
                note,
            },
        );
        let updated = self.locks.run_locked(&assignment.location, || {
            self.repos
                .assignment_repo
                .transition_status(assignment_id, AssignmentStatus::Cancelled, Some(&event))
        })?;
        info!(assignment_id, door_id = %updated.door_id, "作业已取消");
        Ok(updated)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 站点门排程（占用中的分配，按门、开始时间）
    pub fn door_schedule(&self, location: &str) -> ApiResult<Vec<Assignment>> {
        let _perf = PerfGuard::new("dock.door_schedule").with_location(location);
        Ok(self.repos.assignment_repo.list_active_by_location(location)?)
    }

    /// 门事件历史（最新在前）
    pub fn door_events(&self, door_id: &str, limit: Option<usize>) -> ApiResult<Vec<DockEvent>> {
        let _perf = PerfGuard::new("dock.door_events");
        Ok(self
            .repos
            .event_repo
            .list_by_door(door_id, limit.unwrap_or(DEFAULT_EVENT_LIMIT))?)
    }

    /// 作业溯源（时间正序）
    pub fn job_events(&self, ref_id: &str) -> ApiResult<Vec<DockEvent>> {
        Ok(self.repos.event_repo.list_by_ref(ref_id)?)
    }
}
