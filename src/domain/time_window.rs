// ==========================================
// 装卸月台门分配系统 - 时间窗口
// ==========================================
// 语义: 半开区间 [start, end)，首尾相接不算重叠
// ==========================================

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 数据库时间戳格式（UTC）
pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化为数据库时间戳
pub fn format_db_ts(ts: NaiveDateTime) -> String {
    ts.format(DB_DATETIME_FORMAT).to_string()
}

/// 截断到整秒（与库内精度一致）
pub fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// 解析数据库时间戳（兼容带小数秒 / ISO 'T' 分隔）
pub fn parse_db_ts(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DB_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// 两个时间点之间的整分钟数（向下取整）
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_minutes()
}

// ==========================================
// TimeWindow - 半开时间区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// 以起点 + 分钟数构造
    pub fn from_start(start: NaiveDateTime, minutes: i64) -> Self {
        Self {
            start,
            end: start + Duration::minutes(minutes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_min(&self) -> i64 {
        minutes_between(self.start, self.end)
    }

    /// 半开区间重叠判定
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 是否完整包含另一个区间
    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// 区间差: self - other，返回 0/1/2 个非空片段（按时间顺序）
    pub fn subtract(&self, other: &TimeWindow) -> Vec<TimeWindow> {
        if !self.overlaps(other) {
            return if self.is_empty() { Vec::new() } else { vec![*self] };
        }

        let mut fragments = Vec::with_capacity(2);
        if self.start < other.start {
            fragments.push(TimeWindow::new(self.start, other.start));
        }
        if other.end < self.end {
            fragments.push(TimeWindow::new(other.end, self.end));
        }
        fragments
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", format_db_ts(self.start), format_db_ts(self.end))
    }
}
