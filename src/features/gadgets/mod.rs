//! Gadgets, stored in the sidecar state store.

mod repository;

pub use repository::{GadgetRepository, STORE_NAME};

use serde::{Deserialize, Serialize};

use super::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gadget {
    pub id: String,
    pub description: String,
    pub price: f64,
}

impl Resource for Gadget {
    const KIND: &'static str = "gadget";
    const COLLECTION: &'static str = "gadgets";
    const EVENT_PATH: &'static str = "/gadgets.v1";
    const MATCH: Option<&'static str> = Some(r#"event.type == "gadget.v1""#);
    const PRIORITY: i32 = 2;

    fn id(&self) -> &str {
        &self.id
    }
}
