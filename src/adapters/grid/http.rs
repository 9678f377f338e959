//! REST grid store client
//!
//! Talks to a spreadsheet API shaped like the v4 sheets API:
//!
//! - `GET  /v4/spreadsheets/{id}` - sheet properties and merges
//! - `GET  /v4/spreadsheets/{id}/values/{range}` - formatted values
//! - `POST /v4/spreadsheets/{id}/values:batchUpdate` - value writes
//! - `POST /v4/spreadsheets/{id}:batchUpdate` - structural requests
//!
//! Status mapping: 429 is [`SheetfillError::QuotaExceeded`], 404 is
//! [`SheetfillError::NotFound`], 401/403 are authentication failures and 5xx
//! are server errors. Retries are left to
//! [`RetryingGridStore`](super::RetryingGridStore).

use super::traits::{GridRequest, GridStore, SheetMetadata, ValueInputMode, ValueRange};
use crate::config::{SecretString, StoreConfig};
use crate::core::coordinates::GridRange;
use crate::domain::{DocumentId, GridStoreError, Result, SheetName, SheetfillError};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

const METADATA_FIELDS: &str =
    "sheets(properties(sheetId,title,gridProperties(rowCount,columnCount)),merges)";

/// Grid store backed by the REST API
pub struct HttpGridStore {
    base_url: Url,
    client: Client,
    access_token: Option<SecretString>,
}

impl HttpGridStore {
    /// Builds a client from the store configuration
    ///
    /// # Errors
    ///
    /// Returns [`SheetfillError::Configuration`] for an unusable base URL or
    /// when the HTTP client cannot be built.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sheetfill::adapters::grid::HttpGridStore;
    /// use sheetfill::config::StoreConfig;
    ///
    /// let store = HttpGridStore::new(&StoreConfig::default()).unwrap();
    /// ```
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            SheetfillError::Configuration(format!("Invalid store.base_url '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SheetfillError::Configuration(format!(
                "store.base_url '{}' cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SheetfillError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            client,
            access_token: config.access_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SheetfillError::Configuration("store.base_url cannot be a base".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token.expose_secret().as_str()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(map_send_error)?;
        check_status(response).await
    }
}

fn map_send_error(e: reqwest::Error) -> SheetfillError {
    if e.is_timeout() {
        GridStoreError::Timeout(e.to_string()).into()
    } else {
        GridStoreError::ConnectionFailed(e.to_string()).into()
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => {
            SheetfillError::QuotaExceeded(retry_after.unwrap_or_else(|| "unspecified".to_string()))
        }
        StatusCode::NOT_FOUND => SheetfillError::NotFound(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GridStoreError::AuthenticationFailed(format!("{status}: {body}")).into()
        }
        StatusCode::BAD_REQUEST => GridStoreError::InvalidRequest(body).into(),
        s if s.is_server_error() => GridStoreError::ServerError {
            status: s.as_u16(),
            message: body,
        }
        .into(),
        s => GridStoreError::InvalidResponse(format!("unexpected status {s}: {body}")).into(),
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| GridStoreError::InvalidResponse(e.to_string()).into())
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetResource>,
}

#[derive(Debug, Deserialize)]
struct SheetResource {
    properties: SheetProperties,
    #[serde(default)]
    merges: Vec<GridRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GridProperties {
    row_count: u32,
    column_count: u32,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchValuesResponse {
    #[serde(default)]
    total_updated_cells: usize,
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl GridStore for HttpGridStore {
    async fn sheet_metadata(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
    ) -> Result<SheetMetadata> {
        let url = self.endpoint(&["v4", "spreadsheets", document.as_str()])?;
        let request = self.client.get(url).query(&[("fields", METADATA_FIELDS)]);
        let spreadsheet: SpreadsheetResponse = parse_json(self.send(request).await?).await?;

        let resource = match sheet {
            Some(name) => spreadsheet
                .sheets
                .into_iter()
                .find(|s| s.properties.title == name.as_str())
                .ok_or_else(|| {
                    SheetfillError::NotFound(format!("sheet '{name}' in document '{document}'"))
                })?,
            None => spreadsheet.sheets.into_iter().next().ok_or_else(|| {
                SheetfillError::NotFound(format!("document '{document}' has no sheets"))
            })?,
        };

        tracing::debug!(
            document_id = %document,
            sheet = %resource.properties.title,
            merges = resource.merges.len(),
            "Fetched sheet metadata"
        );

        Ok(SheetMetadata {
            sheet_id: resource.properties.sheet_id,
            title: SheetName::new(resource.properties.title)
                .map_err(GridStoreError::InvalidResponse)?,
            row_count: resource.properties.grid_properties.row_count,
            column_count: resource.properties.grid_properties.column_count,
            merges: resource.merges,
        })
    }

    async fn get_values(&self, document: &DocumentId, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.endpoint(&["v4", "spreadsheets", document.as_str(), "values", range])?;
        let request = self
            .client
            .get(url)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")]);
        let response: ValuesResponse = parse_json(self.send(request).await?).await?;

        Ok(response
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn batch_update_values(
        &self,
        document: &DocumentId,
        updates: &[ValueRange],
        mode: ValueInputMode,
    ) -> Result<usize> {
        let url = self.endpoint(&["v4", "spreadsheets", document.as_str(), "values:batchUpdate"])?;
        let body = json!({
            "valueInputOption": mode.as_api_str(),
            "data": updates,
        });
        let response: BatchValuesResponse =
            parse_json(self.send(self.client.post(url).json(&body)).await?).await?;
        Ok(response.total_updated_cells)
    }

    async fn batch_update(&self, document: &DocumentId, requests: &[GridRequest]) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }
        let target = format!("{}:batchUpdate", document.as_str());
        let url = self.endpoint(&["v4", "spreadsheets", target.as_str()])?;
        let body = json!({
            "requests": requests.iter().map(GridRequest::to_api_json).collect::<Vec<_>>(),
        });
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}
