// ==========================================
// 装卸月台门分配系统 - 资源日历数据仓储
// ==========================================
// 对齐: dock_resources 表
// 说明: 核心只读取日历，排班由外部系统维护
// ==========================================

use crate::domain::door::ResourceCalendarSlot;
use crate::domain::time_window::{format_db_ts, parse_db_ts, TimeWindow};
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ResourceCalendarRepository - 资源日历仓储
// ==========================================
pub struct ResourceCalendarRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ResourceCalendarRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ResourceCalendarSlot> {
        let start_raw: String = row.get(1)?;
        let end_raw: String = row.get(2)?;
        Ok(ResourceCalendarSlot {
            location: row.get(0)?,
            slot_start: parse_db_ts(&start_raw)
                .ok_or_else(|| invalid_column(1, "slot_start_utc", &start_raw))?,
            slot_end: parse_db_ts(&end_raw)
                .ok_or_else(|| invalid_column(2, "slot_end_utc", &end_raw))?,
            crews: row.get(3)?,
            forklifts: row.get(4)?,
        })
    }

    /// 批量写入日历时段
    pub fn batch_insert(&self, slots: &[ResourceCalendarSlot]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for slot in slots {
            tx.execute(
                r#"
                INSERT INTO dock_resources (location, slot_start_utc, slot_end_utc, crews, forklifts)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    slot.location,
                    format_db_ts(slot.slot_start),
                    format_db_ts(slot.slot_end),
                    slot.crews,
                    slot.forklifts,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// ResourceCalendar(location, range): 与区间重叠的日历时段，按开始时间升序
    pub fn find_in_range(
        &self,
        location: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<ResourceCalendarSlot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT location, slot_start_utc, slot_end_utc, crews, forklifts
            FROM dock_resources
            WHERE location = ?1
              AND slot_start_utc < ?3
              AND slot_end_utc > ?2
            ORDER BY slot_start_utc, slot_end_utc
            "#,
        )?;
        let slots = stmt
            .query_map(
                params![location, format_db_ts(window.start), format_db_ts(window.end)],
                Self::map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(slots)
    }
}
