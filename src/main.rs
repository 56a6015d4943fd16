// ==========================================
// 装卸月台门分配系统 - 演示入口
// ==========================================
// 用法: dock-door-aps [db_path]
//   db_path 缺省取环境变量 DOCK_APS_DB_PATH，再缺省为 ./dock_door_aps.db
// 流程: 建表 → 写入演示站点（门/资源日历）→ 批量优化并提交 → 输出决策 JSON
// ==========================================

use anyhow::Context;
use chrono::{Duration, NaiveDateTime, Timelike, Utc};

use dock_door_aps::db::open_shared_connection;
use dock_door_aps::domain::door::{Door, ResourceCalendarSlot};
use dock_door_aps::domain::job::{InboundSlotRequest, JobRequest, OutboundSlotRequest};
use dock_door_aps::{logging, Clock, DockApi, DockRepositories};

const DEFAULT_DB_PATH: &str = "dock_door_aps.db";
const DEMO_LOCATION: &str = "FRE";
const DEMO_DOORS: usize = 4;
const CALENDAR_SLOT_MIN: i64 = 15;
const CALENDAR_SLOTS: i64 = 24;

fn resolve_db_path() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DOCK_APS_DB_PATH").ok())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
}

/// 当前时刻向上取整到 5 分钟
fn demo_now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    let base = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let rem = base.minute() as i64 % 5;
    if rem == 0 {
        base
    } else {
        base + Duration::minutes(5 - rem)
    }
}

fn seed_site(repos: &DockRepositories, now: NaiveDateTime) -> anyhow::Result<()> {
    for i in 1..=DEMO_DOORS {
        let door = Door::new(format!("{}-D{:02}", DEMO_LOCATION, i), DEMO_LOCATION, true);
        repos.door_repo.upsert(&door)?;
    }

    let slots: Vec<ResourceCalendarSlot> = (0..CALENDAR_SLOTS)
        .map(|i| {
            let start = now + Duration::minutes(CALENDAR_SLOT_MIN * i);
            ResourceCalendarSlot {
                location: DEMO_LOCATION.to_string(),
                slot_start: start,
                slot_end: start + Duration::minutes(CALENDAR_SLOT_MIN),
                crews: 3,
                forklifts: 3,
            }
        })
        .collect();
    let inserted = repos.calendar_repo.batch_insert(&slots)?;
    tracing::info!(doors = DEMO_DOORS, slots = inserted, "演示站点已写入");
    Ok(())
}

fn demo_jobs(now: NaiveDateTime) -> Vec<JobRequest> {
    let mut jobs: Vec<JobRequest> = (0..5)
        .map(|i| {
            InboundSlotRequest {
                task_id: format!("demo-in-{}", i),
                location: DEMO_LOCATION.to_string(),
                truck_id: format!("T-{:03}", i + 1),
                eta_utc: now + Duration::minutes(10 * i),
                unload_min: 30 + 5 * (i % 3),
                priority: i % 3,
                window_min: 60,
            }
            .to_job_request()
        })
        .collect();

    jobs.extend((0..3).map(|i| {
        OutboundSlotRequest {
            task_id: format!("demo-out-{}", i),
            location: DEMO_LOCATION.to_string(),
            load_id: format!("L-{:03}", i + 1),
            cutoff_utc: now + Duration::minutes(90 + 30 * i),
            load_min: 45,
            priority: 2,
            window_min: 60,
        }
        .to_job_request(now)
    }));
    jobs
}

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", dock_door_aps::APP_NAME, dock_door_aps::VERSION);
    tracing::info!("==================================================");

    let db_path = resolve_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let conn = open_shared_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;

    let now = demo_now();
    let api = DockApi::from_connection(conn)?.with_clock(Clock::Fixed(now));

    seed_site(api.repositories(), now)?;

    let jobs = demo_jobs(now);
    let decision = api.optimize_batch_and_commit(&jobs, DEMO_LOCATION)?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
