// ==========================================
// 装卸月台门分配系统 - 分配记录领域模型
// ==========================================
// 对齐: dock_assignments 表
// 红线: 仅由 DecisionCommitter 在校验通过后创建
// ==========================================

use crate::domain::time_window::TimeWindow;
use crate::domain::types::{AllocationStrategy, AssignmentStatus, JobKind};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Assignment - 已提交的门分配
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub location: String,
    pub door_id: String,
    pub job_kind: JobKind,
    pub ref_id: String,              // truck_id / load_id
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub crew_label: String,          // 班组标签
    pub status: AssignmentStatus,
    pub rationale: AssignmentRationale, // 落位依据 (why_json)
    pub created_at: NaiveDateTime,
}

impl Assignment {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }

    pub fn span(&self) -> OccupiedSpan {
        OccupiedSpan {
            assignment_id: self.assignment_id.clone(),
            door_id: self.door_id.clone(),
            window: self.window(),
            status: self.status,
        }
    }
}

// ==========================================
// AssignmentRationale - 落位依据
// ==========================================
// 改派分类需要原作业的优先级与最早就绪时间，随分配记录一起落库
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRationale {
    pub strategy: AllocationStrategy,
    pub local_cost: i64,
    pub wait_min: i64,
    pub lateness_min: i64,
    pub priority: i64,
    pub earliest_ready: NaiveDateTime,
    pub confidence: f64,
}

// ==========================================
// OccupiedSpan - 门占用区间
// ==========================================
// ExistingAssignments 查询的投影: (door, start, end, status)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupiedSpan {
    pub assignment_id: String,
    pub door_id: String,
    pub window: TimeWindow,
    pub status: AssignmentStatus,
}
