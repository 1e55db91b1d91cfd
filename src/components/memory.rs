//! In-memory state and secret store for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Api, SecretStore, StateItem, StateStore};
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
#[error("lock poisoned: {0}")]
pub struct LockPoisoned(&'static str);

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<HashMap<(String, String), StateItem>>>,
    secrets: Arc<RwLock<HashMap<(String, String), Value>>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn put_secret(&self, store: &str, name: &str, value: Value) {
        self.secrets
            .write()
            .unwrap()
            .insert((store.to_string(), name.to_string()), value);
    }

    pub fn put_raw(&self, store: &str, item: StateItem) {
        self.state
            .write()
            .unwrap()
            .insert((store.to_string(), item.key.clone()), item);
    }

    pub fn raw(&self, store: &str, key: &str) -> Option<StateItem> {
        self.state
            .read()
            .unwrap()
            .get(&(store.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn set_state(&self, store: &str, items: Vec<StateItem>) -> Result<(), ApiError> {
        if self.fail_writes {
            return Err(ApiError::internal(
                std::io::Error::other("write rejected"),
                "could not save state",
            ));
        }
        let mut state = self
            .state
            .write()
            .map_err(|_| ApiError::internal(LockPoisoned("write"), "could not save state"))?;
        for item in items {
            state.insert((store.to_string(), item.key.clone()), item);
        }
        Ok(())
    }

    async fn get_state<T>(&self, store: &str, key: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let value = {
            let state = self
                .state
                .read()
                .map_err(|_| ApiError::internal(LockPoisoned("read"), "could not load state"))?;
            state
                .get(&(store.to_string(), key.to_string()))
                .map(|item| item.value.clone())
        };
        match value {
            None | Some(Value::Null) => Err(ApiError::not_found(format!("key {key:?} not found"))),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_secret<T>(&self, store: &str, name: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let value = self
            .secrets
            .read()
            .map_err(|_| ApiError::internal(LockPoisoned("read"), "could not load secret"))?
            .get(&(store.to_string(), name.to_string()))
            .cloned();
        match value {
            None => Err(ApiError::not_found(format!("secret {name:?} not found"))),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }
}

impl Api for MemoryStore {
    fn name(&self) -> &'static str {
        "In-memory"
    }
}
