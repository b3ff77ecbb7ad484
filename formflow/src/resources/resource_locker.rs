use charybdis::types::Uuid;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes writers of a single form inside this process. Different forms never contend.
///
/// Cross-process safety comes from the conditional writes in the store; this only keeps
/// one instance from racing itself into avoidable `Conflict` errors.
#[derive(Default)]
pub struct ResourceLocker {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Held lock on one resource. Dropping it unlocks and removes the entry once nobody else waits.
pub struct ResourceGuard<'a> {
    locker: &'a ResourceLocker,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locker.forget(self.id);
    }
}

impl ResourceLocker {
    pub async fn lock(&self, id: Uuid) -> ResourceGuard<'_> {
        // clone the handle first so no map shard stays locked across the await
        let mutex = self.locks.entry(id).or_default().clone();
        let guard = mutex.lock_owned().await;

        ResourceGuard {
            locker: self,
            id,
            guard: Some(guard),
        }
    }

    /// Drops the lock entry of a resource nobody is holding or waiting on.
    fn forget(&self, id: Uuid) {
        self.locks.remove_if(&id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_resource_is_serialized() {
        let locker = ResourceLocker::default();
        let id = Uuid::new_v4();

        let guard = locker.lock(id).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locker.lock(id)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(20), locker.lock(id)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn different_resources_do_not_contend() {
        let locker = ResourceLocker::default();

        let _a = locker.lock(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(20), locker.lock(Uuid::new_v4())).await;

        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_locks_leave_no_entries() {
        let locker = ResourceLocker::default();

        for _ in 0..50 {
            let _guard = locker.lock(Uuid::new_v4()).await;
        }

        assert!(locker.is_empty());
    }

    #[tokio::test]
    async fn entry_survives_while_another_writer_waits() {
        let locker = Arc::new(ResourceLocker::default());
        let id = Uuid::new_v4();

        let first = locker.lock(id).await;

        let waiter = {
            let locker = locker.clone();
            tokio::spawn(async move {
                let _second = locker.lock(id).await;
                locker.len()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);

        assert_eq!(waiter.await.unwrap(), 1);
        assert!(locker.is_empty());
    }
}
