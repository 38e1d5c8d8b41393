//! Direct export of the index list from the provider's export endpoint.
//!
//! One POST with a fixed filter payload returns the whole list as an `.xlsx`
//! file. The payload is parsed, its date columns typed and its code column
//! zero-padded. Failures propagate to the caller; there is no retry.

mod workbook;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, info, instrument};

use csindex_shared::{CsIndexError, DirectConfig, Result, Sheet};

pub use workbook::{CODE_WIDTH, DATE_COLUMNS, normalize, parse_date, parse_workbook, zero_pad};

/// User-Agent string for export requests.
const USER_AGENT: &str = concat!("csindex/", env!("CARGO_PKG_VERSION"));

/// Content type the endpoint expects.
const JSON_UTF8: &str = "application/json;charset=UTF-8";

// ---------------------------------------------------------------------------
// Request payload
// ---------------------------------------------------------------------------

/// Body of the export POST.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub sorter: Sorter,
    pub pager: Pager,
    pub index_filter: IndexFilter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sorter {
    /// The endpoint expects the literal string `"null"` here.
    pub sort_field: String,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    pub page_num: u32,
    pub page_size: u32,
}

/// Filter block; every criterion except the series is left unset.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFilter {
    pub if_customized: Option<String>,
    pub if_tracked: Option<String>,
    pub if_weight_capped: Option<String>,
    pub index_compliance: Option<String>,
    pub hot_spot: Option<String>,
    pub index_classify: Option<String>,
    pub currency: Option<String>,
    pub region: Option<String>,
    pub index_series: Vec<String>,
    pub undefined: Option<String>,
}

impl From<&DirectConfig> for ExportRequest {
    fn from(config: &DirectConfig) -> Self {
        Self {
            sorter: Sorter {
                sort_field: "null".into(),
                sort_order: None,
            },
            pager: Pager {
                page_num: config.page_num,
                page_size: config.page_size,
            },
            index_filter: IndexFilter {
                index_series: config.index_series.clone(),
                ..IndexFilter::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry points
// ---------------------------------------------------------------------------

/// Download, parse and normalize the index list.
#[instrument(skip_all, fields(url = %config.export_url))]
pub async fn fetch_index_list(config: &DirectConfig) -> Result<Sheet> {
    let client = build_client(config)?;
    let bytes = download(&client, config).await?;
    let sheet = normalize(parse_workbook(&bytes)?)?;

    info!(
        rows = sheet.rows.len(),
        columns = sheet.headers.len(),
        "index list retrieved"
    );
    Ok(sheet)
}

/// POST the export request and return the raw response body.
pub async fn download(client: &Client, config: &DirectConfig) -> Result<Vec<u8>> {
    let url = &config.export_url;
    let body = serde_json::to_vec(&ExportRequest::from(config))
        .map_err(|e| CsIndexError::Network(format!("{url}: failed to encode request: {e}")))?;

    info!(series = ?config.index_series, "requesting index list export");

    let response = client
        .post(url)
        .header(CONTENT_TYPE, JSON_UTF8)
        .body(body)
        .send()
        .await
        .map_err(|e| CsIndexError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CsIndexError::Network(format!("{url}: HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CsIndexError::Network(format!("{url}: failed to read body: {e}")))?;

    debug!(bytes = bytes.len(), "export payload received");
    Ok(bytes.to_vec())
}

/// Build a reqwest client with appropriate settings.
fn build_client(config: &DirectConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| CsIndexError::Network(format!("failed to build HTTP client: {e}")))
}
