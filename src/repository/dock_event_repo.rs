// ==========================================
// 装卸月台门分配系统 - 溯源事件数据仓储
// ==========================================
// 对齐: dock_events 表
// 红线: 只追加 (append-only)，不提供更新/删除
// ==========================================

use crate::domain::dock_event::{DockEvent, ReasonDetail};
use crate::domain::time_window::{format_db_ts, parse_db_ts};
use crate::domain::types::{DockEventType, JobKind};
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 在给定连接（或事务）上写入一条事件
///
/// 供 AssignmentRepository 在同一事务内与分配记录一起提交
pub(crate) fn insert_event(conn: &Connection, event: &DockEvent) -> RepositoryResult<()> {
    let detail_json = serde_json::to_string(&event.reason_detail)?;
    conn.execute(
        r#"
        INSERT INTO dock_events (
            event_id, ts_utc, location, door_id, job_type, ref_id,
            event_type, reason_code, reason_detail
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            event.event_id,
            format_db_ts(event.ts),
            event.location,
            event.door_id,
            event.job_kind.map(|k| k.as_str()),
            event.ref_id,
            event.event_type.as_str(),
            event.reason_code().as_str(),
            detail_json,
        ],
    )?;
    Ok(())
}

// ==========================================
// DockEventRepository - 溯源事件仓储
// ==========================================
pub struct DockEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DockEventRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<DockEvent> {
        let ts_raw: String = row.get(1)?;
        let job_type: Option<String> = row.get(4)?;
        let event_type_raw: String = row.get(6)?;
        let detail_raw: String = row.get(7)?;

        let job_kind = match job_type {
            Some(raw) => Some(JobKind::parse(&raw).ok_or_else(|| invalid_column(4, "job_type", &raw))?),
            None => None,
        };
        let reason_detail: ReasonDetail = serde_json::from_str(&detail_raw)
            .map_err(|_| invalid_column(7, "reason_detail", &detail_raw))?;

        Ok(DockEvent {
            event_id: row.get(0)?,
            ts: parse_db_ts(&ts_raw).ok_or_else(|| invalid_column(1, "ts_utc", &ts_raw))?,
            location: row.get(2)?,
            door_id: row.get(3)?,
            job_kind,
            ref_id: row.get(5)?,
            event_type: DockEventType::parse(&event_type_raw)
                .ok_or_else(|| invalid_column(6, "event_type", &event_type_raw))?,
            reason_detail,
        })
    }

    /// AppendEvent: 追加单条事件
    pub fn append(&self, event: &DockEvent) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_event(&conn, event)?;
        Ok(event.event_id.clone())
    }

    /// 按门查询事件历史（最新在前）
    pub fn list_by_door(&self, door_id: &str, limit: usize) -> RepositoryResult<Vec<DockEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, ts_utc, location, door_id, job_type, ref_id, event_type, reason_detail
            FROM dock_events
            WHERE door_id = ?1
            ORDER BY ts_utc DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let events = stmt
            .query_map(params![door_id, limit as i64], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// 按作业引用查询事件（时间正序）
    pub fn list_by_ref(&self, ref_id: &str) -> RepositoryResult<Vec<DockEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, ts_utc, location, door_id, job_type, ref_id, event_type, reason_detail
            FROM dock_events
            WHERE ref_id = ?1
            ORDER BY ts_utc, rowid
            "#,
        )?;
        let events = stmt
            .query_map(params![ref_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }
}
