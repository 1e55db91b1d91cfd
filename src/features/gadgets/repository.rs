use std::sync::Arc;

use async_trait::async_trait;

use super::Gadget;
use crate::components::{StateItem, StateStore};
use crate::error::ApiError;
use crate::features::Store;

pub const STORE_NAME: &str = "statestore";

fn key(id: &str) -> String {
    format!("gadget:{id}")
}

/// Gadgets in the sidecar state store, keyed `gadget:{id}`.
#[derive(Debug)]
pub struct GadgetRepository<S> {
    state: Arc<S>,
    store_name: String,
}

impl<S> Clone for GadgetRepository<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store_name: self.store_name.clone(),
        }
    }
}

impl<S: StateStore> GadgetRepository<S> {
    pub fn new(state: Arc<S>) -> Self {
        Self {
            state,
            store_name: STORE_NAME.to_string(),
        }
    }

    pub fn with_store_name(self, store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            ..self
        }
    }
}

#[async_trait]
impl<S: StateStore + 'static> Store<Gadget> for GadgetRepository<S> {
    async fn load(&self, id: &str) -> Result<Gadget, ApiError> {
        tracing::info!(id, store = %self.store_name, "loading gadget state");
        self.state
            .get_state(&self.store_name, &key(id))
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    err.with_message(format!("gadget {id:?} not found"))
                } else {
                    err.with_message(format!("could not load gadget {id:?}"))
                }
            })
    }

    async fn save(&self, gadget: &Gadget) -> Result<(), ApiError> {
        tracing::info!(id = %gadget.id, store = %self.store_name, "saving gadget state");
        let item = StateItem::new(key(&gadget.id), gadget)?;
        self.state
            .set_state(&self.store_name, vec![item])
            .await
            .map_err(|err| err.with_message(format!("could not save gadget {:?}", gadget.id)))
    }
}
