// ==========================================
// 装卸月台门分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod dock_event;
pub mod door;
pub mod job;
pub mod proposal;
pub mod time_window;
pub mod types;

// 重导出核心类型
pub use assignment::{Assignment, AssignmentRationale, OccupiedSpan};
pub use dock_event::{ChoiceDetail, DockEvent, ReasonDetail, ReassignmentParty};
pub use door::{Door, ResourceCalendarSlot};
pub use job::{InboundSlotRequest, JobRequest, OutboundSlotRequest};
pub use proposal::{
    AcceptedProposal, Decision, Feasibility, Proposal, Rejection, RejectionReason,
    ValidationFailure,
};
pub use time_window::TimeWindow;
pub use types::{AllocationStrategy, AssignmentStatus, DockEventType, JobKind, ReasonCode};
