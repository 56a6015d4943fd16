// ==========================================
// 装卸月台门分配系统 - 分配器参数
// ==========================================
// 存储: config_kv 表 (scope_id='global')，缺省时使用 Default
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置层错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值非法 (key={key}): {message}")]
    InvalidValue { key: String, message: String },

    #[error("配置存储失败: {0}")]
    Storage(#[from] crate::repository::error::RepositoryError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// AllocatorConfig - 分配器参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// 批量优化规划视野（分钟）
    pub horizon_min: i64,
    /// 批量优化时间粒度（分钟）
    pub slot_min: i64,
    /// 批量优化时间预算（毫秒）
    pub solver_time_budget_ms: u64,
    /// 置信度接受阈值
    pub acceptance_threshold: f64,
    /// 同一批次内每次拒绝累加的惩罚
    pub rejection_penalty: f64,
    /// 作业未给出 max_wait 时的默认值（分钟）
    pub default_max_wait_min: i64,
    pub min_crews: i64,
    pub min_forklifts: i64,
    /// 改派分类: 竞争占用的判定半径（分钟）
    pub competing_window_min: i64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            horizon_min: 240,
            slot_min: 5,
            solver_time_budget_ms: 1800,
            acceptance_threshold: 0.6,
            rejection_penalty: 0.1,
            default_max_wait_min: 30,
            min_crews: 1,
            min_forklifts: 1,
            competing_window_min: 30,
        }
    }
}

impl AllocatorConfig {
    /// 参数合法性校验
    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(key: &str, message: &str) -> ConfigError {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            }
        }

        if self.slot_min <= 0 {
            return Err(invalid("slot_min", "必须大于0"));
        }
        if self.horizon_min < self.slot_min {
            return Err(invalid("horizon_min", "不能小于 slot_min"));
        }
        if self.solver_time_budget_ms == 0 {
            return Err(invalid("solver_time_budget_ms", "必须大于0"));
        }
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(invalid("acceptance_threshold", "必须位于 [0, 1]"));
        }
        if self.rejection_penalty < 0.0 {
            return Err(invalid("rejection_penalty", "不能为负"));
        }
        if self.default_max_wait_min < 0 {
            return Err(invalid("default_max_wait_min", "不能为负"));
        }
        if self.min_crews < 0 || self.min_forklifts < 0 {
            return Err(invalid("min_crews/min_forklifts", "不能为负"));
        }
        if self.competing_window_min < 0 {
            return Err(invalid("competing_window_min", "不能为负"));
        }
        Ok(())
    }

    /// 视野内时间片数量
    pub fn horizon_slots(&self) -> usize {
        (self.horizon_min / self.slot_min).max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = AllocatorConfig::default();
        assert_eq!(cfg.horizon_min, 240);
        assert_eq!(cfg.slot_min, 5);
        assert_eq!(cfg.horizon_slots(), 48);
        assert_eq!(cfg.solver_time_budget_ms, 1800);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = AllocatorConfig {
            slot_min: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = AllocatorConfig {
            acceptance_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "acceptance_threshold"
        ));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let cfg: AllocatorConfig = serde_json::from_str(r#"{"slot_min": 15}"#).unwrap();
        assert_eq!(cfg.slot_min, 15);
        assert_eq!(cfg.horizon_min, 240);
    }
}
