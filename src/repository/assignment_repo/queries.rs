use super::{AssignmentRepository, ACTIVE_STATUS_SQL, ASSIGNMENT_COLUMNS};
use crate::domain::assignment::{Assignment, OccupiedSpan};
use crate::domain::time_window::{format_db_ts, TimeWindow};
use crate::repository::error::RepositoryResult;
use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, OptionalExtension};

impl AssignmentRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, assignment_id: &str) -> RepositoryResult<Option<Assignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM dock_assignments WHERE assignment_id = ?1",
            ASSIGNMENT_COLUMNS
        );
        let found = conn
            .query_row(&sql, params![assignment_id], Self::map_row)
            .optional()?;
        Ok(found)
    }

    /// ExistingAssignments(location, range)
    ///
    /// 仅返回 scheduled/in_progress 且与区间重叠的分配，按 door_id、开始时间排序
    pub fn find_active_in_range(
        &self,
        location: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<OccupiedSpan>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM dock_assignments
            WHERE location = ?1
              AND status IN {}
              AND start_utc < ?3
              AND end_utc > ?2
            ORDER BY door_id, start_utc
            "#,
            ASSIGNMENT_COLUMNS, ACTIVE_STATUS_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let spans = stmt
            .query_map(
                params![location, format_db_ts(window.start), format_db_ts(window.end)],
                Self::map_row,
            )?
            .map(|r| r.map(|a| a.span()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(spans)
    }

    /// 单门上与区间重叠的占用（校验器快照使用）
    pub fn find_active_on_door(
        &self,
        door_id: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<OccupiedSpan>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM dock_assignments
            WHERE door_id = ?1
              AND status IN {}
              AND start_utc < ?3
              AND end_utc > ?2
            ORDER BY start_utc
            "#,
            ASSIGNMENT_COLUMNS, ACTIVE_STATUS_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let spans = stmt
            .query_map(
                params![door_id, format_db_ts(window.start), format_db_ts(window.end)],
                Self::map_row,
            )?
            .map(|r| r.map(|a| a.span()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(spans)
    }

    /// 站点门排程: 全部占用中的分配，按门、开始时间排序
    pub fn list_active_by_location(&self, location: &str) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM dock_assignments
            WHERE location = ?1 AND status IN {}
            ORDER BY door_id, start_utc
            "#,
            ASSIGNMENT_COLUMNS, ACTIVE_STATUS_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![location], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 同门、开始时间落在任一参考时刻 ±radius_min 内的其他占用分配数
    pub fn count_active_near(
        &self,
        door_id: &str,
        first: NaiveDateTime,
        second: NaiveDateTime,
        radius_min: i64,
        exclude_ids: (&str, &str),
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let radius = Duration::minutes(radius_min);
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM dock_assignments
            WHERE door_id = ?1
              AND status IN {}
              AND assignment_id NOT IN (?2, ?3)
              AND ((start_utc BETWEEN ?4 AND ?5) OR (start_utc BETWEEN ?6 AND ?7))
            "#,
            ACTIVE_STATUS_SQL
        );
        let count: i64 = conn.query_row(
            &sql,
            params![
                door_id,
                exclude_ids.0,
                exclude_ids.1,
                format_db_ts(first - radius),
                format_db_ts(first + radius),
                format_db_ts(second - radius),
                format_db_ts(second + radius),
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
