// ==========================================
// 装卸月台门分配系统 - API 层
// ==========================================
// 职责: 对外业务接口（提案、提交、批量优化、改派、执行跟踪）
// ==========================================

pub mod dock_api;
pub mod error;
pub mod request_validator;

// 重导出核心类型
pub use dock_api::{Clock, DockApi};
pub use error::{ApiError, ApiResult};
