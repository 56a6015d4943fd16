// ==========================================
// 装卸月台门分配系统 - 空闲窗口计算
// ==========================================
// 职责: 规划视野内每个启用门的空闲时间段
// 输入: 启用门列表 + 视野起点/长度 + 现有占用
// 输出: BTreeMap<door_id, Vec<TimeWindow>>（门按ID、窗口按开始时间）
// 红线: 仅 scheduled / in_progress 占用参与扣减
// ==========================================

use crate::domain::assignment::OccupiedSpan;
use crate::domain::door::Door;
use crate::domain::time_window::TimeWindow;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::instrument;

/// 门 → 空闲窗口
pub type FreeWindows = BTreeMap<String, Vec<TimeWindow>>;

// ==========================================
// FreeWindowCalculator - 空闲窗口计算器
// ==========================================
pub struct FreeWindowCalculator {
    // 无状态引擎
}

impl FreeWindowCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算空闲窗口
    ///
    /// # 参数
    /// - `doors`: 站点的门（停用门会被忽略）
    /// - `now`: 视野起点
    /// - `horizon_min`: 视野长度（分钟）
    /// - `spans`: 现有占用（状态非占用的记录会被忽略）
    ///
    /// # 返回
    /// 启用门全部出现在结果中，无空闲时间的门对应空列表
    #[instrument(skip(self, doors, spans), fields(doors = doors.len(), spans = spans.len()))]
    pub fn compute(
        &self,
        doors: &[Door],
        now: NaiveDateTime,
        horizon_min: i64,
        spans: &[OccupiedSpan],
    ) -> FreeWindows {
        let horizon = TimeWindow::from_start(now, horizon_min);

        let mut result: FreeWindows = BTreeMap::new();
        for door in doors.iter().filter(|d| d.is_active) {
            let initial = if horizon.is_empty() { Vec::new() } else { vec![horizon] };
            result.insert(door.door_id.clone(), initial);
        }

        for span in spans.iter().filter(|s| s.status.is_active()) {
            let Some(windows) = result.get_mut(&span.door_id) else {
                continue;
            };
            if !span.window.overlaps(&horizon) {
                continue;
            }
            *windows = windows
                .iter()
                .flat_map(|w| w.subtract(&span.window))
                .collect();
        }

        for windows in result.values_mut() {
            windows.retain(|w| !w.is_empty());
            windows.sort_by_key(|w| w.start);
        }

        result
    }
}

impl Default for FreeWindowCalculator {
    fn default() -> Self {
        Self::new()
    }
}
