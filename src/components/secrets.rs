use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Remote secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch secret `name` and decode its key/value map into `T`.
    ///
    /// An empty secret is `NOT_FOUND`.
    async fn get_secret<T>(&self, store: &str, name: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send;
}
