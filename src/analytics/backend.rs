//! Analytics backends
//!
//! A backend knows how to authenticate a principal and run a bound query.
//! `HttpQueryBackend` talks to a Metabase-compatible dataset API; the
//! synthetic backend (see `synthetic.rs`) serves canned rows for demos and tests.

use super::query::BoundQuery;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

/// One result row, keyed by column name
pub type Row = Map<String, Value>;

/// Header carrying the session token on dataset requests
pub const SESSION_HEADER: &str = "X-Metabase-Session";

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Namespace under which this backend's credentials are cached
    fn name(&self) -> &'static str;

    /// Obtain a fresh session token for `principal`
    async fn authenticate(&self, principal: &str) -> Result<SecretString>;

    /// Run a bound query. Fails with `Error::AuthExpired` when the token was rejected.
    async fn execute(&self, token: &SecretString, query: &BoundQuery) -> Result<Vec<Row>>;
}

/// Backend for a Metabase-compatible analytics server
pub struct HttpQueryBackend {
    client: Client,
    base_url: Url,
    database_id: u64,
    password: Option<SecretString>,
}

impl HttpQueryBackend {
    pub fn new(base_url: Url, database_id: u64, password: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            database_id,
            password,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Build the native dataset request body for a bound query
    fn dataset_body(&self, query: &BoundQuery) -> Value {
        let mut template_tags = Map::new();
        let mut parameters = Vec::new();

        for parameter in &query.parameters {
            // Tags the template does not reference would be rejected upstream
            if !query.sql.contains(&format!("{{{{{}}}}}", parameter.name)) {
                continue;
            }
            let (tag_type, parameter_type) = if parameter.value.is_number() {
                ("number", "number/=")
            } else {
                ("text", "category")
            };
            template_tags.insert(
                parameter.name.to_string(),
                json!({
                    "name": parameter.name,
                    "display-name": parameter.name,
                    "type": tag_type,
                }),
            );
            parameters.push(json!({
                "type": parameter_type,
                "target": ["variable", ["template-tag", parameter.name]],
                "value": parameter.value,
            }));
        }

        json!({
            "database": self.database_id,
            "type": "native",
            "native": {
                "query": query.sql,
                "template-tags": template_tags,
            },
            "parameters": parameters,
        })
    }
}

#[async_trait]
impl QueryBackend for HttpQueryBackend {
    fn name(&self) -> &'static str {
        "analytics"
    }

    async fn authenticate(&self, principal: &str) -> Result<SecretString> {
        let password = self.password.as_ref().ok_or_else(|| {
            Error::Config("ANALYTICS_PASSWORD is required for live analytics queries".to_string())
        })?;

        let response = self
            .client
            .post(self.endpoint("api/session"))
            .json(&json!({
                "username": principal,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Analytics login failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "Analytics login for {} returned {}",
                principal, status
            )));
        }

        let session: SessionResponse = response.json().await.map_err(|e| {
            Error::Transport(format!("Failed to parse analytics session: {}", e))
        })?;

        tracing::info!(principal, "Authenticated against analytics server");
        Ok(SecretString::from(session.id))
    }

    async fn execute(&self, token: &SecretString, query: &BoundQuery) -> Result<Vec<Row>> {
        let response = self
            .client
            .post(self.endpoint("api/dataset"))
            .header(SESSION_HEADER, token.expose_secret())
            .json(&self.dataset_body(query))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Analytics query failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(Error::AuthExpired(self.name().to_string())),
            status if !status.is_success() => {
                return Err(Error::Transport(format!(
                    "Analytics query {} returned {}",
                    query.metric.name(),
                    status
                )))
            }
            _ => {}
        }

        let dataset: DatasetResponse = response.json().await.map_err(|e| {
            Error::Transport(format!("Failed to parse analytics response: {}", e))
        })?;

        decode_dataset(query, dataset)
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DatasetResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<DatasetData>,
}

#[derive(Debug, Deserialize)]
struct DatasetData {
    cols: Vec<DatasetColumn>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct DatasetColumn {
    name: String,
}

/// Zip column names with row values
fn decode_dataset(query: &BoundQuery, dataset: DatasetResponse) -> Result<Vec<Row>> {
    if dataset.status.as_deref() == Some("failed") {
        return Err(Error::Transport(format!(
            "Analytics query {} failed: {}",
            query.metric.name(),
            dataset.error.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    let data = dataset.data.ok_or_else(|| {
        Error::malformed_result(query.metric.name(), "response carries no data")
    })?;

    data.rows
        .into_iter()
        .map(|values| {
            if values.len() != data.cols.len() {
                return Err(Error::malformed_result(
                    query.metric.name(),
                    format!(
                        "row has {} values for {} columns",
                        values.len(),
                        data.cols.len()
                    ),
                ));
            }
            Ok(data
                .cols
                .iter()
                .map(|col| col.name.clone())
                .zip(values)
                .collect())
        })
        .collect()
}
