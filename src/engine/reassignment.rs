// ==========================================
// 装卸月台门分配系统 - 改派原因分类
// ==========================================
// 判定顺序:
// 1) 新作业优先级更高        → priority_change
// 2) 同门 ±N 分钟内存在竞争占用 → operational_conflict
// 3) 其他                    → eta_slip
// 说明: 原因码为尽力而为的标注，不影响提交结果
// ==========================================

use crate::domain::dock_event::{ReasonDetail, ReassignmentParty};
use crate::domain::time_window::minutes_between;

pub struct ReassignmentClassifier {}

impl ReassignmentClassifier {
    pub fn new() -> Self {
        Self {}
    }

    /// # 参数
    /// - `competing_count`: 同门上开始时间落在双方开始时间 ±N 分钟内的其他占用数
    pub fn classify(
        &self,
        previous: ReassignmentParty,
        new: ReassignmentParty,
        competing_count: i64,
    ) -> ReasonDetail {
        if new.priority > previous.priority {
            let priority_delta = new.priority - previous.priority;
            return ReasonDetail::PriorityChange {
                previous,
                new,
                priority_delta,
            };
        }

        if competing_count > 0 {
            return ReasonDetail::OperationalConflict {
                previous,
                new,
                competing_assignment_count: competing_count,
            };
        }

        let eta_delta_minutes = minutes_between(previous.earliest_ready, new.earliest_ready);
        ReasonDetail::EtaSlip {
            previous,
            new,
            eta_delta_minutes,
        }
    }
}

impl Default for ReassignmentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
