// ==========================================
// 装卸月台门分配系统 - 站点提交锁
// ==========================================
// 同一站点的 "校验 → 提交" 串行执行
// 不同站点互不阻塞
// 多站点加锁按站点名升序获取，避免死锁
// ==========================================

use crate::repository::error::RepositoryError;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct LocationLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LocationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, location: &str) -> Result<Arc<Mutex<()>>, RepositoryError> {
        let mut map = self
            .locks
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(map
            .entry(location.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// 持有站点锁执行闭包
    pub fn run_locked<T, E>(&self, location: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let lock = self.lock_for(location)?;
        let _guard = lock
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        f()
    }

    /// 持有多个站点锁执行闭包（一次提交序列涉及的全部站点）
    pub fn run_locked_all<'a, T, E>(
        &self,
        locations: impl IntoIterator<Item = &'a str>,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let ordered: BTreeSet<&str> = locations.into_iter().collect();
        let locks = ordered
            .into_iter()
            .map(|location| self.lock_for(location))
            .collect::<Result<Vec<_>, _>>()?;

        let mut guards = Vec::with_capacity(locks.len());
        for lock in &locks {
            guards.push(
                lock.lock()
                    .map_err(|e| RepositoryError::LockError(e.to_string()))?,
            );
        }
        let result = f();
        drop(guards);
        result
    }
}
