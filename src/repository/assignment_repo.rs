// ==========================================
// 装卸月台门分配系统 - 门分配数据仓储
// ==========================================
// 对齐: dock_assignments 表
// 红线: 分配记录与溯源事件必须在同一事务内提交
// ==========================================

mod queries;


use crate::domain::assignment::Assignment;
use crate::domain::dock_event::DockEvent;
use crate::domain::time_window::{format_db_ts, parse_db_ts};
use crate::domain::types::{AssignmentStatus, JobKind};
use crate::repository::dock_event_repo::insert_event;
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 占用状态 SQL 片段（与 AssignmentStatus::is_active 保持一致）
pub(crate) const ACTIVE_STATUS_SQL: &str = "('scheduled', 'in_progress')";

pub(crate) const ASSIGNMENT_COLUMNS: &str = r#"
    assignment_id, location, door_id, job_type, ref_id,
    start_utc, end_utc, crew, status, why_json, created_utc
"#;

// ==========================================
// AssignmentRepository - 门分配仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub(crate) fn map_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
        let job_type: String = row.get(3)?;
        let start_raw: String = row.get(5)?;
        let end_raw: String = row.get(6)?;
        let status_raw: String = row.get(8)?;
        let why_raw: String = row.get(9)?;
        let created_raw: String = row.get(10)?;

        Ok(Assignment {
            assignment_id: row.get(0)?,
            location: row.get(1)?,
            door_id: row.get(2)?,
            job_kind: JobKind::parse(&job_type).ok_or_else(|| invalid_column(3, "job_type", &job_type))?,
            ref_id: row.get(4)?,
            start: parse_db_ts(&start_raw).ok_or_else(|| invalid_column(5, "start_utc", &start_raw))?,
            end: parse_db_ts(&end_raw).ok_or_else(|| invalid_column(6, "end_utc", &end_raw))?,
            crew_label: row.get(7)?,
            status: AssignmentStatus::parse(&status_raw)
                .ok_or_else(|| invalid_column(8, "status", &status_raw))?,
            rationale: serde_json::from_str(&why_raw).map_err(|_| invalid_column(9, "why_json", &why_raw))?,
            created_at: parse_db_ts(&created_raw)
                .ok_or_else(|| invalid_column(10, "created_utc", &created_raw))?,
        })
    }

    fn insert_row(conn: &Connection, assignment: &Assignment) -> RepositoryResult<()> {
        let why_json = serde_json::to_string(&assignment.rationale)?;
        conn.execute(
            r#"
            INSERT INTO dock_assignments (
                assignment_id, location, door_id, job_type, ref_id,
                start_utc, end_utc, crew, status, why_json, created_utc
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                assignment.assignment_id,
                assignment.location,
                assignment.door_id,
                assignment.job_kind.as_str(),
                assignment.ref_id,
                format_db_ts(assignment.start),
                format_db_ts(assignment.end),
                assignment.crew_label,
                assignment.status.as_str(),
                why_json,
                format_db_ts(assignment.created_at),
            ],
        )?;
        Ok(())
    }

    fn load_in(conn: &Connection, assignment_id: &str) -> RepositoryResult<Option<Assignment>> {
        let sql = format!(
            "SELECT {} FROM dock_assignments WHERE assignment_id = ?1",
            ASSIGNMENT_COLUMNS
        );
        let found = conn
            .query_row(&sql, params![assignment_id], Self::map_row)
            .optional()?;
        Ok(found)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// PersistAssignment + AppendEvent: 分配记录与 assigned 事件同事务提交
    pub fn insert_with_event(&self, assignment: &Assignment, event: &DockEvent) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::insert_row(&tx, assignment)?;
        insert_event(&tx, event)?;

        tx.commit()?;
        Ok(())
    }

    /// 状态流转（执行跟踪）
    ///
    /// # 参数
    /// - `assignment_id`: 分配ID
    /// - `to`: 目标状态
    /// - `event`: 需要同事务追加的事件（completed / cancelled），开始作业时为 None
    ///
    /// # 返回
    /// - Ok(Assignment): 更新后的分配记录
    /// - Err(NotFound / InvalidStateTransition)
    pub fn transition_status(
        &self,
        assignment_id: &str,
        to: AssignmentStatus,
        event: Option<&DockEvent>,
    ) -> RepositoryResult<Assignment> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut current = Self::load_in(&tx, assignment_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Assignment".to_string(),
            id: assignment_id.to_string(),
        })?;

        if !current.status.can_transition_to(to) {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            });
        }

        tx.execute(
            "UPDATE dock_assignments SET status = ?1 WHERE assignment_id = ?2 AND status = ?3",
            params![to.as_str(), assignment_id, current.status.as_str()],
        )?;
        if let Some(event) = event {
            insert_event(&tx, event)?;
        }

        tx.commit()?;
        current.status = to;
        Ok(current)
    }

    /// 改派提交: 原分配置为 reassigned + 新分配落库 + assigned/reassigned 两条事件
    ///
    /// 原分配必须仍为 scheduled，否则整体回滚
    pub fn reassign_with_events(
        &self,
        displaced_id: &str,
        new_assignment: &Assignment,
        assigned_event: &DockEvent,
        reassigned_event: &DockEvent,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE dock_assignments SET status = ?1 WHERE assignment_id = ?2 AND status = ?3",
            params![
                AssignmentStatus::Reassigned.as_str(),
                displaced_id,
                AssignmentStatus::Scheduled.as_str()
            ],
        )?;
        if rows == 0 {
            // 事务随 tx drop 回滚
            return Err(match Self::load_in(&tx, displaced_id)? {
                Some(a) => RepositoryError::InvalidStateTransition {
                    from: a.status.to_string(),
                    to: AssignmentStatus::Reassigned.to_string(),
                },
                None => RepositoryError::NotFound {
                    entity: "Assignment".to_string(),
                    id: displaced_id.to_string(),
                },
            });
        }

        Self::insert_row(&tx, new_assignment)?;
        insert_event(&tx, assigned_event)?;
        insert_event(&tx, reassigned_event)?;

        tx.commit()?;
        Ok(())
    }
}
