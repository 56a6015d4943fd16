// ==========================================
// 装卸月台门分配系统 - 性能统计
// ==========================================
// 粒度: 每个 DockApi 操作一个 PerfGuard（可嵌套）
// SQL 计数: rusqlite trace/profile 回调，只计入当前线程的活跃操作
// 慢 SQL: 归属到当前线程最内层的操作名
// ==========================================

use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const PERF_SQL_ENV: &str = "DOCK_APS_PERF_SQL";
const SLOW_SQL_ENV: &str = "DOCK_APS_SLOW_SQL_MS";
const SQL_LOG_MAX_CHARS: usize = 240;

static SQL_TRACING: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SqlCounters {
    statements: u64,
    slow: u64,
}

impl SqlCounters {
    fn since(self, baseline: SqlCounters) -> SqlCounters {
        SqlCounters {
            statements: self.statements.saturating_sub(baseline.statements),
            slow: self.slow.saturating_sub(baseline.slow),
        }
    }
}

thread_local! {
    static COUNTERS: Cell<SqlCounters> = Cell::new(SqlCounters::default());
    // 活跃操作栈，末尾为最内层
    static ACTIVE_OPS: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
}

// ==========================================
// SqlTraceSettings - SQL 统计开关
// ==========================================

/// SQL 统计开关与慢 SQL 阈值
///
/// - `DOCK_APS_PERF_SQL`: 1/true/on 开启，其余关闭；未设置时 Debug 开启、Release 关闭
/// - `DOCK_APS_SLOW_SQL_MS`: 慢 SQL 阈值（毫秒），0 表示不记录；默认 Debug 50、Release 200
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlTraceSettings {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl SqlTraceSettings {
    pub fn from_env() -> Self {
        let enabled = std::env::var(PERF_SQL_ENV).ok();
        let slow_ms = std::env::var(SLOW_SQL_ENV).ok();
        Self::from_values(enabled.as_deref(), slow_ms.as_deref())
    }

    fn from_values(enabled: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = enabled.map_or(cfg!(debug_assertions), is_true);
        let slow_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }
}

fn is_true(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on")
}

/// 压平空白并按字符截断，供日志输出
fn shorten_sql(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SQL_LOG_MAX_CHARS {
        return flat;
    }
    let mut short: String = flat.chars().take(SQL_LOG_MAX_CHARS).collect();
    short.push('…');
    short
}

fn current_op() -> Option<&'static str> {
    ACTIVE_OPS.with(|ops| ops.borrow().last().copied())
}

fn counters() -> SqlCounters {
    COUNTERS.with(Cell::get)
}

fn record_statement() {
    if current_op().is_none() {
        return;
    }
    COUNTERS.with(|c| {
        let mut v = c.get();
        v.statements = v.statements.saturating_add(1);
        c.set(v);
    });
}

fn record_slow_statement() {
    if current_op().is_none() {
        return;
    }
    COUNTERS.with(|c| {
        let mut v = c.get();
        v.slow = v.slow.saturating_add(1);
        c.set(v);
    });
}

/// 为连接安装 SQL trace/profile 回调（设置取自环境变量）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let settings = SqlTraceSettings::from_env();
    SQL_TRACING.store(settings.enabled, Ordering::Relaxed);
    SLOW_SQL_MS.store(settings.slow_ms, Ordering::Relaxed);

    if settings.enabled {
        conn.trace(Some(on_sql_trace));
        conn.profile(Some(on_sql_profile));
    } else {
        conn.trace(None);
        conn.profile(None);
    }
}

fn on_sql_trace(_sql: &str) {
    if SQL_TRACING.load(Ordering::Relaxed) {
        record_statement();
    }
}

fn on_sql_profile(sql: &str, duration: Duration) {
    if !SQL_TRACING.load(Ordering::Relaxed) {
        return;
    }
    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if threshold == 0 || ms < threshold {
        return;
    }

    warn!(
        target: "slow_sql",
        op = current_op().unwrap_or("-"),
        duration_ms = ms,
        sql = %shorten_sql(sql),
        "慢 SQL"
    );
    record_slow_statement();
}

// ==========================================
// PerfGuard - 操作级统计
// ==========================================

/// 操作级性能统计，Drop 时输出 `perf` 日志
///
/// ```ignore
/// let _perf = PerfGuard::new("dock.optimize_batch_and_commit")
///     .with_location("FRE")
///     .with_items(jobs.len());
/// ```
pub struct PerfGuard {
    op: &'static str,
    location: Option<String>,
    items: Option<usize>,
    started: Instant,
    baseline: SqlCounters,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        ACTIVE_OPS.with(|ops| ops.borrow_mut().push(op));
        Self {
            op,
            location: None,
            items: None,
            started: Instant::now(),
            baseline: counters(),
        }
    }

    /// 附带站点
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// 附带处理条数（提案数 / 作业数）
    pub fn with_items(mut self, items: usize) -> Self {
        self.items = Some(items);
        self
    }

    fn sql_delta(&self) -> SqlCounters {
        counters().since(self.baseline)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let delta = self.sql_delta();
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            target: "perf",
            op = self.op,
            location = self.location.as_deref().unwrap_or("-"),
            items = ?self.items,
            elapsed_ms,
            sql_count = delta.statements,
            slow_sql_count = delta.slow,
            "done"
        );

        ACTIVE_OPS.with(|ops| {
            let mut ops = ops.borrow_mut();
            if let Some(pos) = ops.iter().rposition(|op| *op == self.op) {
                ops.remove(pos);
            }
        });
    }
}
