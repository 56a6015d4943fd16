// ==========================================
// 装卸月台门分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::allocator_config::{AllocatorConfig, ConfigResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(RepositoryError::from)?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(RepositoryError::from)?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（键有序）
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(RepositoryError::from)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(RepositoryError::from)?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(RepositoryError::from)?;
        Ok(rows)
    }

    fn get_parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + std::fmt::Display + Copy,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 加载分配器参数（缺省项取 Default，结果经过 validate）
    pub fn load_allocator_config(&self) -> ConfigResult<AllocatorConfig> {
        let d = AllocatorConfig::default();
        let cfg = AllocatorConfig {
            horizon_min: self.get_parsed_or(config_keys::HORIZON_MIN, d.horizon_min)?,
            slot_min: self.get_parsed_or(config_keys::SLOT_MIN, d.slot_min)?,
            solver_time_budget_ms: self
                .get_parsed_or(config_keys::SOLVER_TIME_BUDGET_MS, d.solver_time_budget_ms)?,
            acceptance_threshold: self
                .get_parsed_or(config_keys::ACCEPTANCE_THRESHOLD, d.acceptance_threshold)?,
            rejection_penalty: self.get_parsed_or(config_keys::REJECTION_PENALTY, d.rejection_penalty)?,
            default_max_wait_min: self
                .get_parsed_or(config_keys::DEFAULT_MAX_WAIT_MIN, d.default_max_wait_min)?,
            min_crews: self.get_parsed_or(config_keys::MIN_CREWS, d.min_crews)?,
            min_forklifts: self.get_parsed_or(config_keys::MIN_FORKLIFTS, d.min_forklifts)?,
            competing_window_min: self
                .get_parsed_or(config_keys::COMPETING_WINDOW_MIN, d.competing_window_min)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// 将参数整体写回 config_kv
    pub fn save_allocator_config(&self, cfg: &AllocatorConfig) -> ConfigResult<()> {
        cfg.validate()?;
        let entries: [(&str, String); 9] = [
            (config_keys::HORIZON_MIN, cfg.horizon_min.to_string()),
            (config_keys::SLOT_MIN, cfg.slot_min.to_string()),
            (config_keys::SOLVER_TIME_BUDGET_MS, cfg.solver_time_budget_ms.to_string()),
            (config_keys::ACCEPTANCE_THRESHOLD, cfg.acceptance_threshold.to_string()),
            (config_keys::REJECTION_PENALTY, cfg.rejection_penalty.to_string()),
            (config_keys::DEFAULT_MAX_WAIT_MIN, cfg.default_max_wait_min.to_string()),
            (config_keys::MIN_CREWS, cfg.min_crews.to_string()),
            (config_keys::MIN_FORKLIFTS, cfg.min_forklifts.to_string()),
            (config_keys::COMPETING_WINDOW_MIN, cfg.competing_window_min.to_string()),
        ];

        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;
        for (key, value) in entries.iter() {
            tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )
            .map_err(RepositoryError::from)?;
        }
        tx.commit().map_err(RepositoryError::from)?;
        Ok(())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量优化
    pub const HORIZON_MIN: &str = "dock.horizon_min";
    pub const SLOT_MIN: &str = "dock.slot_min";
    pub const SOLVER_TIME_BUDGET_MS: &str = "dock.solver_time_budget_ms";

    // 置信度
    pub const ACCEPTANCE_THRESHOLD: &str = "dock.acceptance_threshold";
    pub const REJECTION_PENALTY: &str = "dock.rejection_penalty";

    // 启发式
    pub const DEFAULT_MAX_WAIT_MIN: &str = "dock.default_max_wait_min";

    // 资源下限
    pub const MIN_CREWS: &str = "dock.min_crews";
    pub const MIN_FORKLIFTS: &str = "dock.min_forklifts";

    // 改派分类
    pub const COMPETING_WINDOW_MIN: &str = "dock.competing_window_min";
}
