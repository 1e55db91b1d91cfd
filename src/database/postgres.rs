//! tokio-postgres implementation of [`Database`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row, Statement};

use super::{Database, DatabaseError, Prepared, SqlValue};
use crate::components::SecretStore;

/// Credentials stored in the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbCreds {
    /// `host` or `host:port`.
    pub host: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DbCreds {
    pub fn config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        match self.host.rsplit_once(':') {
            Some((host, port)) if port.parse::<u16>().is_ok() => {
                config.host(host);
                if let Ok(port) = port.parse::<u16>() {
                    config.port(port);
                }
            }
            _ => {
                config.host(&self.host);
            }
        }
        config
            .user(&self.username)
            .password(&self.password)
            .dbname(&self.database);
        config
    }
}

/// A single pipelined connection with its prepared statements.
pub struct PgDatabase {
    client: Client,
    statements: HashMap<&'static str, Statement>,
}

impl std::fmt::Debug for PgDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.statements.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("PgDatabase")
            .field("statements", &names)
            .finish()
    }
}

/// Read the credentials from `secret_name` in `secret_store`, connect and
/// prepare `statements`.
pub async fn connect<S>(
    secrets: &S,
    secret_store: &str,
    secret_name: &str,
    statements: &[Prepared],
) -> Result<PgDatabase, DatabaseError>
where
    S: SecretStore + ?Sized,
{
    let creds: DbCreds = secrets
        .get_secret(secret_store, secret_name)
        .await
        .map_err(DatabaseError::Credentials)?;

    let (client, connection) = creds.config().connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::error!(error = %err, "postgres connection closed");
        }
    });

    let mut prepared = HashMap::with_capacity(statements.len());
    for statement in statements {
        prepared.insert(statement.name, client.prepare(statement.sql).await?);
    }
    tracing::info!(host = %creds.host, database = %creds.database, "connected to postgres");

    Ok(PgDatabase {
        client,
        statements: prepared,
    })
}

impl PgDatabase {
    fn statement(&self, name: &str) -> Result<&Statement, DatabaseError> {
        self.statements
            .get(name)
            .ok_or_else(|| DatabaseError::UnknownStatement(name.to_string()))
    }
}

fn to_params(params: &[SqlValue]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    params
        .iter()
        .map(|param| -> Box<dyn ToSql + Sync + Send> {
            match param {
                SqlValue::Null => Box::new(Option::<String>::None),
                SqlValue::Text(text) => Box::new(text.clone()),
                SqlValue::Float(value) => Box::new(*value),
            }
        })
        .collect()
}

fn column(row: &Row, index: usize) -> Result<SqlValue, DatabaseError> {
    let ty = row.columns()[index].type_();
    let value = if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(index)?.map(SqlValue::Float)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(index)?
            .map(|value| SqlValue::Float(f64::from(value)))
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        row.try_get::<_, Option<String>>(index)?.map(SqlValue::Text)
    } else {
        return Err(DatabaseError::UnsupportedColumn {
            index,
            type_name: ty.name().to_string(),
        });
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

#[async_trait]
impl Database for PgDatabase {
    async fn execute(&self, statement: &str, params: &[SqlValue]) -> Result<u64, DatabaseError> {
        let statement = self.statement(statement)?;
        let boxed = to_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> = boxed
            .iter()
            .map(|param| param.as_ref() as &(dyn ToSql + Sync))
            .collect();
        Ok(self.client.execute(statement, &refs).await?)
    }

    async fn query_row(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<SqlValue>>, DatabaseError> {
        let statement = self.statement(statement)?;
        let boxed = to_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> = boxed
            .iter()
            .map(|param| param.as_ref() as &(dyn ToSql + Sync))
            .collect();
        let Some(row) = self.client.query_opt(statement, &refs).await? else {
            return Ok(None);
        };
        (0..row.len())
            .map(|index| column(&row, index))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}
