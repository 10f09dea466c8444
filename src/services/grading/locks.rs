//! 进程内咨询锁
//!
//! 同一评分员的生命周期决策（懒创建、轮换、修正表计算）必须串行；
//! 同一文书的评分写入需要串行以配合事务内计数。
//! 锁按 key 惰性创建，存活期跟随服务实例。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// 取得 key 对应的锁并等待持有
    pub async fn acquire(&self, key: String) -> OwnedMutexGuard<()> {
        // 先克隆 Arc 再 await，避免跨 await 持有分段锁
        let lock = self.locks.entry(key).or_default().clone();
        lock.lock_owned().await
    }

    pub fn grader_key(user_id: i64, event_id: i64) -> String {
        format!("grader:{user_id}:{event_id}")
    }

    pub fn essay_key(essay_id: &str) -> String {
        format!("essay:{essay_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let registry = Arc::new(LockRegistry::new());
        let counter = Arc::new(std::sync::Mutex::new(0_i32));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = registry.acquire(LockRegistry::grader_key(1, 1)).await;
                let value = { *counter.lock().unwrap() };
                tokio::task::yield_now().await;
                *counter.lock().unwrap() = value + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // 没有锁的话 read-yield-write 会互相覆盖
        assert_eq!(*counter.lock().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let registry = LockRegistry::new();
        let _a = registry.acquire(LockRegistry::essay_key("e1")).await;
        // 不同 key 立即可得，不会死锁
        let _b = registry.acquire(LockRegistry::essay_key("e2")).await;
    }
}
