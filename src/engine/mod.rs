// ==========================================
// 装卸月台门分配系统 - 引擎层
// ==========================================
// 职责: 空闲窗口 / 启发式 / 批量优化 / 校验 / 评分 / 提交
// 红线: Engine 不拼 SQL，存储访问统一经 DockRepositories
// ==========================================

pub mod batch_optimizer;
pub mod committer;
pub mod confidence;
pub mod free_window;
pub mod greedy;
pub mod location_lock;
pub mod reassignment;
pub mod repositories;
pub mod validator;

// 重导出核心引擎
pub use batch_optimizer::{BatchOptimizer, BatchPlacement, BatchSolution, SolveStatus};
pub use committer::{DecisionCommitter, Evaluation};
pub use confidence::{ConfidenceScore, ConfidenceScorer};
pub use free_window::{FreeWindowCalculator, FreeWindows};
pub use greedy::{lateness_min, local_cost, GreedyAllocator, Placement};
pub use location_lock::LocationLocks;
pub use reassignment::ReassignmentClassifier;
pub use repositories::DockRepositories;
pub use validator::{ConstraintValidator, ValidationSnapshot};
