// ==========================================
// 装卸月台门分配系统 - 月台门与资源日历
// ==========================================
// 对齐: dock_doors / dock_resources 表
// ==========================================

use crate::domain::time_window::TimeWindow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Door - 月台门
// ==========================================
// 容量: 同一时刻只服务一个作业
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub door_id: String,  // 门ID
    pub location: String, // 站点
    pub is_active: bool,  // 是否启用
}

impl Door {
    pub fn new(door_id: impl Into<String>, location: impl Into<String>, is_active: bool) -> Self {
        Self {
            door_id: door_id.into(),
            location: location.into(),
            is_active,
        }
    }
}

// ==========================================
// ResourceCalendarSlot - 资源日历时段
// ==========================================
// 站点级共享资源池，不绑定具体门
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCalendarSlot {
    pub location: String,
    pub slot_start: NaiveDateTime,
    pub slot_end: NaiveDateTime,
    pub crews: i64,     // 可用班组数
    pub forklifts: i64, // 可用叉车数
}

impl ResourceCalendarSlot {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.slot_start, self.slot_end)
    }
}
