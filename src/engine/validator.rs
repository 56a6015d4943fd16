// ==========================================
// 装卸月台门分配系统 - 硬约束校验
// ==========================================
// 校验顺序（短路）:
// 1) 门存在、启用、属于提案站点
// 2) 门上无重叠的占用（首尾相接不算）
// 3) 资源日历覆盖整个区间且班组/叉车不低于下限
// 红线: 纯函数；提交时必须在站点锁内基于最新快照重跑
// ==========================================

use crate::domain::assignment::OccupiedSpan;
use crate::domain::door::{Door, ResourceCalendarSlot};
use crate::domain::proposal::{Proposal, ValidationFailure};
use tracing::debug;

/// 校验快照: 一次校验所需的全部存储状态
#[derive(Debug, Clone, Default)]
pub struct ValidationSnapshot {
    pub door: Option<Door>,
    /// 该门上与提案区间重叠的占用
    pub door_spans: Vec<OccupiedSpan>,
    /// 站点内与提案区间重叠的日历时段
    pub calendar: Vec<ResourceCalendarSlot>,
}

impl ValidationSnapshot {
    /// 去掉指定分配后的快照（改派时排除被替换的分配）
    pub fn without_assignment(mut self, assignment_id: &str) -> Self {
        self.door_spans.retain(|s| s.assignment_id != assignment_id);
        self
    }
}

// ==========================================
// ConstraintValidator - 硬约束校验器
// ==========================================
pub struct ConstraintValidator {
    min_crews: i64,
    min_forklifts: i64,
}

impl ConstraintValidator {
    pub fn new(min_crews: i64, min_forklifts: i64) -> Self {
        Self {
            min_crews,
            min_forklifts,
        }
    }

    pub fn validate(&self, proposal: &Proposal, snapshot: &ValidationSnapshot) -> Result<(), ValidationFailure> {
        self.check_door(proposal, snapshot)?;
        self.check_overlap(proposal, snapshot)?;
        self.check_resources(proposal, snapshot)?;
        Ok(())
    }

    fn check_door(&self, proposal: &Proposal, snapshot: &ValidationSnapshot) -> Result<(), ValidationFailure> {
        match &snapshot.door {
            Some(door)
                if door.is_active
                    && door.door_id == proposal.door_id
                    && door.location == proposal.location =>
            {
                Ok(())
            }
            _ => Err(ValidationFailure::InactiveOrMissingDoor {
                door_id: proposal.door_id.clone(),
            }),
        }
    }

    fn check_overlap(&self, proposal: &Proposal, snapshot: &ValidationSnapshot) -> Result<(), ValidationFailure> {
        let window = proposal.window();
        let conflict = snapshot.door_spans.iter().find(|s| {
            s.door_id == proposal.door_id && s.status.is_active() && s.window.overlaps(&window)
        });

        match conflict {
            Some(span) => Err(ValidationFailure::DoubleBooking {
                door_id: proposal.door_id.clone(),
                conflicting_assignment_id: span.assignment_id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_resources(&self, proposal: &Proposal, snapshot: &ValidationSnapshot) -> Result<(), ValidationFailure> {
        let window = proposal.window();
        let mut slots: Vec<&ResourceCalendarSlot> = snapshot
            .calendar
            .iter()
            .filter(|s| s.location == proposal.location && s.window().overlaps(&window))
            .collect();

        if slots.is_empty() {
            return Err(ValidationFailure::NoResourceCalendar {
                location: proposal.location.clone(),
            });
        }

        let insufficient = || ValidationFailure::InsufficientResources {
            min_crews: self.min_crews,
            min_forklifts: self.min_forklifts,
        };

        slots.sort_by_key(|s| (s.slot_start, s.slot_end));

        let mut covered_until = window.start;
        for slot in slots {
            if slot.crews < self.min_crews || slot.forklifts < self.min_forklifts {
                debug!(slot_start = %slot.slot_start, crews = slot.crews, forklifts = slot.forklifts, "资源不足");
                return Err(insufficient());
            }
            if slot.slot_start > covered_until {
                debug!(gap_from = %covered_until, gap_to = %slot.slot_start, "日历存在空档");
                return Err(insufficient());
            }
            covered_until = covered_until.max(slot.slot_end);
        }

        if covered_until < window.end {
            return Err(insufficient());
        }
        Ok(())
    }
}

impl Default for ConstraintValidator {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
