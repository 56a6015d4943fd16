// ==========================================
// 装卸月台门分配系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合分配核心所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    AssignmentRepository, DockEventRepository, DoorRepository, ResourceCalendarRepository,
};

/// 分配核心仓储集合
///
/// # 包含的仓储
/// - `door_repo`: 月台门（ActiveDoors）
/// - `calendar_repo`: 资源日历（ResourceCalendar）
/// - `assignment_repo`: 门分配（ExistingAssignments / PersistAssignment）
/// - `event_repo`: 溯源事件（AppendEvent）
#[derive(Clone)]
pub struct DockRepositories {
    pub door_repo: Arc<DoorRepository>,
    pub calendar_repo: Arc<ResourceCalendarRepository>,
    pub assignment_repo: Arc<AssignmentRepository>,
    pub event_repo: Arc<DockEventRepository>,
}

impl DockRepositories {
    pub fn new(
        door_repo: Arc<DoorRepository>,
        calendar_repo: Arc<ResourceCalendarRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        event_repo: Arc<DockEventRepository>,
    ) -> Self {
        Self {
            door_repo,
            calendar_repo,
            assignment_repo,
            event_repo,
        }
    }

    /// 基于同一共享连接构建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(DoorRepository::new(conn.clone())),
            Arc::new(ResourceCalendarRepository::new(conn.clone())),
            Arc::new(AssignmentRepository::new(conn.clone())),
            Arc::new(DockEventRepository::new(conn)),
        )
    }
}
