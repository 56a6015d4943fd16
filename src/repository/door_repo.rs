// ==========================================
// 装卸月台门分配系统 - 月台门数据仓储
// ==========================================
// 对齐: dock_doors 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::door::Door;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// DoorRepository - 月台门仓储
// ==========================================
pub struct DoorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DoorRepository {
    /// 创建新的月台门仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Door> {
        Ok(Door {
            door_id: row.get(0)?,
            location: row.get(1)?,
            is_active: row.get::<_, i64>(2)? == 1,
        })
    }

    /// 新增或覆盖月台门
    pub fn upsert(&self, door: &Door) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO dock_doors (door_id, location, is_active)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(door_id) DO UPDATE SET location = ?2, is_active = ?3
            "#,
            params![door.door_id, door.location, door.is_active as i64],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, door_id: &str) -> RepositoryResult<Option<Door>> {
        let conn = self.get_conn()?;
        let door = conn
            .query_row(
                "SELECT door_id, location, is_active FROM dock_doors WHERE door_id = ?1",
                params![door_id],
                Self::map_row,
            )
            .optional()?;
        Ok(door)
    }

    /// ActiveDoors(location): 站点内启用的门，按 door_id 升序
    pub fn list_active(&self, location: &str) -> RepositoryResult<Vec<Door>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT door_id, location, is_active
            FROM dock_doors
            WHERE location = ?1 AND is_active = 1
            ORDER BY door_id
            "#,
        )?;
        let doors = stmt
            .query_map(params![location], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(doors)
    }

    /// 启用/停用月台门
    ///
    /// # 返回
    /// - Err(NotFound): 门不存在
    pub fn set_active(&self, door_id: &str, is_active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE dock_doors SET is_active = ?1 WHERE door_id = ?2",
            params![is_active as i64, door_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Door".to_string(),
                id: door_id.to_string(),
            });
        }
        Ok(())
    }
}
