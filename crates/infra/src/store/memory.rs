//! In-memory instance store
//!
//! Every mutation is a single atomic operation behind one `RwLock`, which
//! gives the per-key serialization the provisioning service relies on.
//! Reads taken by the sweeper never block concurrent creations for longer
//! than one map access.

use std::collections::HashMap;

use async_trait::async_trait;
use chalforge_core::InstanceStore;
use chalforge_domain::{ChallengeInstance, Result};
use tokio::sync::RwLock;

/// Reference `InstanceStore` backed by a `HashMap`
#[derive(Default)]
pub struct MemoryInstanceStore {
    records: RwLock<HashMap<String, ChallengeInstance>>,
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstanceStore for MemoryInstanceStore {
    async fn insert(&self, instance: ChallengeInstance) -> Result<()> {
        self.records.write().await.insert(instance.service_id.clone(), instance);
        Ok(())
    }

    async fn get(&self, service_id: &str) -> Result<Option<ChallengeInstance>> {
        Ok(self.records.read().await.get(service_id).cloned())
    }

    async fn remove(&self, service_id: &str) -> Result<()> {
        self.records.write().await.remove(service_id);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<ChallengeInstance>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(service_id: &str) -> ChallengeInstance {
        ChallengeInstance {
            service_id: service_id.to_string(),
            challenge_id: "5".into(),
            team_id: "9".into(),
            user_id: "17".into(),
            hostname: "x.example.com".into(),
            port: "30000".into(),
            created_at: 1_000,
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn insert_get_remove_roundtrip() {
        let store = MemoryInstanceStore::new();
        store.insert(instance("svc-1")).await.unwrap();
        assert!(store.get("svc-1").await.unwrap().is_some());
        assert!(store.get("svc-2").await.unwrap().is_none());

        store.remove("svc-1").await.unwrap();
        assert!(store.get("svc-1").await.unwrap().is_none());
        // Removing an absent record is a no-op.
        store.remove("svc-1").await.unwrap();
    }

    #[tokio::test]
    async fn insert_replaces_existing_record() {
        let store = MemoryInstanceStore::new();
        store.insert(instance("svc-1")).await.unwrap();
        let mut updated = instance("svc-1");
        updated.port = "31000".into();
        store.insert(updated).await.unwrap();

        let record = store.get("svc-1").await.unwrap().unwrap();
        assert_eq!(record.port, "31000");
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_scans_every_record() {
        let store = MemoryInstanceStore::new();
        store.insert(instance("svc-1")).await.unwrap();
        store.insert(instance("svc-2")).await.unwrap();
        assert_eq!(store.all().await.unwrap().len(), 2);
    }
}
