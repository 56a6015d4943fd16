// ==========================================
// 装卸月台门分配系统 - 领域类型定义
// ==========================================
// 数据库存储格式: snake_case 小写字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// 作业类型 (Job Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Inbound,  // 入库卸车
    Outbound, // 出库装车
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Inbound => "inbound",
            JobKind::Outbound => "outbound",
        }
    }

    /// 从数据库字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "inbound" => Some(JobKind::Inbound),
            "outbound" => Some(JobKind::Outbound),
            _ => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 分配状态 (Assignment Status)
// ==========================================
// 状态机:
//   scheduled -> in_progress -> completed
//   scheduled -> reassigned
//   scheduled / in_progress -> cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Scheduled,  // 已排定
    InProgress, // 作业中
    Completed,  // 已完成
    Reassigned, // 已被改派
    Cancelled,  // 已取消
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Scheduled => "scheduled",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Reassigned => "reassigned",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Some(AssignmentStatus::Scheduled),
            "in_progress" => Some(AssignmentStatus::InProgress),
            "completed" => Some(AssignmentStatus::Completed),
            "reassigned" => Some(AssignmentStatus::Reassigned),
            "cancelled" => Some(AssignmentStatus::Cancelled),
            _ => None,
        }
    }

    /// 是否占用门（参与空闲窗口与重叠校验）
    pub fn is_active(&self) -> bool {
        matches!(self, AssignmentStatus::Scheduled | AssignmentStatus::InProgress)
    }

    /// 状态机校验
    pub fn can_transition_to(&self, to: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, to),
            (Scheduled, InProgress)
                | (InProgress, Completed)
                | (Scheduled, Reassigned)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    /// 数据库中视为“占用”的状态列表（SQL IN 子句用）
    pub fn active_db_values() -> [&'static str; 2] {
        [
            AssignmentStatus::Scheduled.as_str(),
            AssignmentStatus::InProgress.as_str(),
        ]
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 分配策略 (Allocation Strategy)
// ==========================================
// 决定 assigned 事件的 reason_code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    Heuristic, // 单作业贪心
    Solver,    // 批量优化
}

impl AllocationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStrategy::Heuristic => "heuristic",
            AllocationStrategy::Solver => "solver",
        }
    }

    /// Decision.why 中使用的提交标签
    pub fn commit_tag(&self) -> &'static str {
        match self {
            AllocationStrategy::Heuristic => "heuristic_commit",
            AllocationStrategy::Solver => "solver_commit",
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 事件类型 (Dock Event Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockEventType {
    Assigned,
    Reassigned,
    Completed,
    Cancelled,
}

impl DockEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DockEventType::Assigned => "assigned",
            DockEventType::Reassigned => "reassigned",
            DockEventType::Completed => "completed",
            DockEventType::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "assigned" => Some(DockEventType::Assigned),
            "reassigned" => Some(DockEventType::Reassigned),
            "completed" => Some(DockEventType::Completed),
            "cancelled" => Some(DockEventType::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for DockEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 原因代码 (Reason Code)
// ==========================================
// 与 ReasonDetail 变体一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    HeuristicChoice,
    SolverChoice,
    PriorityChange,
    EtaSlip,
    OperationalConflict,
    NormalCompletion,
    Cancelled,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::HeuristicChoice => "heuristic_choice",
            ReasonCode::SolverChoice => "solver_choice",
            ReasonCode::PriorityChange => "priority_change",
            ReasonCode::EtaSlip => "eta_slip",
            ReasonCode::OperationalConflict => "operational_conflict",
            ReasonCode::NormalCompletion => "normal_completion",
            ReasonCode::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 业务ID生成
// ==========================================
// 前缀: asg- / evt- / prop- / dec-
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_status_state_machine() {
        use AssignmentStatus::*;
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Reassigned));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Reassigned));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Scheduled));
    }

    #[test]
    fn test_only_scheduled_and_in_progress_are_active() {
        assert!(AssignmentStatus::Scheduled.is_active());
        assert!(AssignmentStatus::InProgress.is_active());
        assert!(!AssignmentStatus::Completed.is_active());
        assert!(!AssignmentStatus::Reassigned.is_active());
        assert!(!AssignmentStatus::Cancelled.is_active());
    }

    #[test]
    fn test_parse_db_strings() {
        assert_eq!(AssignmentStatus::parse("in_progress"), Some(AssignmentStatus::InProgress));
        assert_eq!(JobKind::parse("OUTBOUND"), Some(JobKind::Outbound));
        assert_eq!(DockEventType::parse("reassigned"), Some(DockEventType::Reassigned));
        assert_eq!(AssignmentStatus::parse("unknown"), None);
    }
}
