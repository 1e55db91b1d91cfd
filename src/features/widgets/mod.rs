//! Widgets, stored in the relational database.

mod repository;

pub use repository::{WidgetRepository, SELECT, STATEMENTS, UPSERT};

use serde::{Deserialize, Serialize};

use super::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub description: String,
    pub price: f64,
}

impl Resource for Widget {
    const KIND: &'static str = "widget";
    const COLLECTION: &'static str = "widgets";
    const EVENT_PATH: &'static str = "/widgets.v1";
    const MATCH: Option<&'static str> = Some(r#"event.type == "widget.v1""#);
    const PRIORITY: i32 = 1;

    fn id(&self) -> &str {
        &self.id
    }
}
