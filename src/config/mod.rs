// ==========================================
// 装卸月台门分配系统 - 配置层
// ==========================================
// 职责: 分配器参数的加载与覆写
// 存储: config_kv 表
// ==========================================

pub mod allocator_config;
pub mod config_manager;

// 重导出
pub use allocator_config::{AllocatorConfig, ConfigError, ConfigResult};
pub use config_manager::{config_keys, ConfigManager};
