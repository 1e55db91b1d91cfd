use async_trait::async_trait;

use super::Widget;
use crate::database::{Database, Prepared, SqlValue};
use crate::error::ApiError;
use crate::features::Store;

pub const UPSERT: &str = "upsert";
pub const SELECT: &str = "select";

/// Statements to prepare on every widgets connection.
pub const STATEMENTS: &[Prepared] = &[
    Prepared {
        name: UPSERT,
        sql: "INSERT INTO widgets (id, description, price) \
              VALUES ($1, $2, $3) \
              ON CONFLICT ON CONSTRAINT widgets_pkey \
              DO UPDATE SET description = $2, price = $3",
    },
    Prepared {
        name: SELECT,
        sql: "SELECT description, price FROM widgets WHERE id = $1",
    },
];

#[derive(Debug, thiserror::Error)]
#[error("unexpected row shape for widget {0:?}")]
struct UnexpectedRow(String);

/// Widgets in the `widgets` table.
#[derive(Debug)]
pub struct WidgetRepository<D> {
    db: D,
}

impl<D: Database> WidgetRepository<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<D: Database> Store<Widget> for WidgetRepository<D> {
    async fn load(&self, id: &str) -> Result<Widget, ApiError> {
        tracing::info!(id, "loading widget from DB");
        let row = self
            .db
            .query_row(SELECT, &[SqlValue::from(id)])
            .await
            .map_err(|err| {
                tracing::error!(id, error = %err, "error loading widget");
                ApiError::internal(err, format!("could not load widget {id:?}"))
            })?;
        let Some(row) = row else {
            return Err(ApiError::not_found(format!(
                "widget with id {id:?} was not found"
            )));
        };

        match row.as_slice() {
            [description, price] => match (description.as_text(), price.as_float()) {
                (Some(description), Some(price)) => Ok(Widget {
                    id: id.to_string(),
                    description: description.to_string(),
                    price,
                }),
                _ => Err(ApiError::internal(
                    UnexpectedRow(id.to_string()),
                    format!("could not load widget {id:?}"),
                )),
            },
            _ => Err(ApiError::internal(
                UnexpectedRow(id.to_string()),
                format!("could not load widget {id:?}"),
            )),
        }
    }

    async fn save(&self, widget: &Widget) -> Result<(), ApiError> {
        tracing::info!(id = %widget.id, "saving widget to DB");
        let params = [
            SqlValue::from(widget.id.as_str()),
            SqlValue::from(widget.description.as_str()),
            SqlValue::from(widget.price),
        ];
        self.db.execute(UPSERT, &params).await.map_err(|err| {
            tracing::error!(id = %widget.id, error = %err, "error saving widget");
            ApiError::internal(err, format!("could not save widget {:?}", widget.id))
        })?;
        Ok(())
    }
}
