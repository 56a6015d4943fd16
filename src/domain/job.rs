// ==========================================
// 装卸月台门分配系统 - 作业请求
// ==========================================
// 入库: 卡车 ETA 登记 -> 最早就绪 = ETA，无截止时间
// 出库: 装车截单登记 -> 最早就绪 = 当前时刻，截止 = cutoff
// ==========================================

use crate::domain::time_window::truncate_to_second;
use crate::domain::types::JobKind;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

fn default_window_min() -> i64 {
    60
}

// ==========================================
// JobRequest - 通用作业请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: String,                   // 作业引用ID (truck_id / load_id)
    pub kind: JobKind,                    // 入库/出库
    pub location: String,                 // 站点
    pub earliest_ready: NaiveDateTime,    // 最早可开始时间
    pub deadline: Option<NaiveDateTime>,  // 截止时间（可选）
    pub duration_min: i64,                // 作业时长（分钟）
    #[serde(default)]
    pub priority: i64,                    // 优先级（越大越紧急）
    #[serde(default)]
    pub max_wait_min: Option<i64>,        // 最大可容忍等待（仅单作业分配使用，缺省取配置）
}

impl JobRequest {
    /// 完工时间
    pub fn finish_at(&self, start: NaiveDateTime) -> NaiveDateTime {
        start + Duration::minutes(self.duration_min)
    }

    /// 时间字段截断到整秒
    pub fn truncated_to_second(&self) -> JobRequest {
        JobRequest {
            earliest_ready: truncate_to_second(self.earliest_ready),
            deadline: self.deadline.map(truncate_to_second),
            ..self.clone()
        }
    }
}

// ==========================================
// InboundSlotRequest - 入库卸车请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundSlotRequest {
    pub task_id: String,
    pub location: String,
    pub truck_id: String,
    pub eta_utc: NaiveDateTime,
    pub unload_min: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_window_min")]
    pub window_min: i64,
}

impl InboundSlotRequest {
    pub fn to_job_request(&self) -> JobRequest {
        JobRequest {
            job_id: self.truck_id.clone(),
            kind: JobKind::Inbound,
            location: self.location.clone(),
            earliest_ready: truncate_to_second(self.eta_utc),
            deadline: None,
            duration_min: self.unload_min,
            priority: self.priority,
            max_wait_min: Some(self.window_min),
        }
    }
}

// ==========================================
// OutboundSlotRequest - 出库装车请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundSlotRequest {
    pub task_id: String,
    pub location: String,
    pub load_id: String,
    pub cutoff_utc: NaiveDateTime,
    pub load_min: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_window_min")]
    pub window_min: i64,
}

impl OutboundSlotRequest {
    /// 出库作业随时可装，最早就绪时间取调用时刻
    pub fn to_job_request(&self, now: NaiveDateTime) -> JobRequest {
        JobRequest {
            job_id: self.load_id.clone(),
            kind: JobKind::Outbound,
            location: self.location.clone(),
            earliest_ready: truncate_to_second(now),
            deadline: Some(truncate_to_second(self.cutoff_utc)),
            duration_min: self.load_min,
            priority: self.priority,
            max_wait_min: Some(self.window_min),
        }
    }
}
