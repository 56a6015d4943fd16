// ==========================================
// 装卸月台门分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 分配与优化核心（提案 → 校验 → 评分 → 提交）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配规则与优化
pub mod engine;

// 配置层 - 分配器参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationStrategy, AssignmentStatus, DockEventType, JobKind, ReasonCode};

// 领域实体
pub use domain::{
    Assignment, Decision, DockEvent, Door, InboundSlotRequest, JobRequest, OutboundSlotRequest,
    Proposal, ReasonDetail, ResourceCalendarSlot, TimeWindow,
};

// 引擎
pub use engine::{
    BatchOptimizer, ConfidenceScorer, ConstraintValidator, DecisionCommitter, DockRepositories,
    FreeWindowCalculator, GreedyAllocator, LocationLocks,
};

// 配置
pub use config::{AllocatorConfig, ConfigManager};

// API
pub use api::{ApiError, ApiResult, Clock, DockApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "装卸月台门分配系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
