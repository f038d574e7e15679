//! Azure DevOps REST client.
//!
//! One client is constructed per invocation from the resolved
//! configuration and passed down explicitly; there is no shared global
//! instance. The flow is always two round trips: a WIQL query for ids,
//! then batch fetches of full records. Retry and backoff are deliberately
//! absent; a failed call surfaces as a typed error.

use crate::config::{Config, ConnectionConfig};
use crate::error::Error;
use crate::models::SprintWindow;
use chrono::{DateTime, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// The batch work-items endpoint caps one request at 200 ids.
const MAX_BATCH_IDS: usize = 200;

/// Client for the Azure DevOps work-item and iteration endpoints.
pub struct AzdoClient {
    http: reqwest::Client,
    /// `https://dev.azure.com/{org}/{project}`
    base_url: String,
    pat: String,
    api_version: String,
}

/// WIQL query response: a list of id references.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WiqlResponse {
    #[serde(default)]
    work_items: Vec<WorkItemRef>,
}

#[derive(Debug, Deserialize)]
struct WorkItemRef {
    id: u64,
}

/// Batch work-items response. Records stay as raw JSON until the
/// normalizer flattens them.
#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    value: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct IterationsResponse {
    #[serde(default)]
    value: Vec<Iteration>,
}

#[derive(Debug, Deserialize)]
struct Iteration {
    name: String,
    attributes: Option<IterationAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IterationAttributes {
    start_date: Option<String>,
    finish_date: Option<String>,
}

impl Iteration {
    fn into_sprint_window(self) -> SprintWindow {
        let (start, finish) = match self.attributes {
            Some(attrs) => (
                attrs.start_date.as_deref().and_then(parse_api_date),
                attrs.finish_date.as_deref().and_then(parse_api_date),
            ),
            None => (None, None),
        };
        SprintWindow {
            name: self.name,
            start,
            finish,
        }
    }
}

/// Iteration dates come back as RFC 3339 timestamps at midnight.
fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

impl AzdoClient {
    /// Build a client for one organization/project.
    pub fn new(
        connection: &ConnectionConfig,
        timeout: Duration,
        api_version: &str,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Api(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: format!(
                "https://dev.azure.com/{}/{}",
                connection.organization, connection.project
            ),
            pat: connection.pat.clone(),
            api_version: api_version.to_string(),
        })
    }

    /// Build a client from the resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(
            &config.connection,
            Duration::from_secs(config.query.timeout_seconds),
            &config.query.api_version,
        )
    }

    /// Run a WIQL query and return the matching work-item ids.
    pub async fn query_ids(&self, wiql: &str) -> Result<Vec<u64>, Error> {
        let url = format!(
            "{}/_apis/wit/wiql?api-version={}",
            self.base_url, self.api_version
        );
        debug!("WIQL query: {}", wiql);

        let response = self
            .http
            .post(&url)
            .basic_auth("", Some(&self.pat))
            .json(&serde_json::json!({ "query": wiql }))
            .send()
            .await
            .map_err(|e| Error::Api(format!("WIQL request failed: {}", e)))?;

        let body: WiqlResponse = Self::read_json(response).await?;
        let ids: Vec<u64> = body.work_items.into_iter().map(|r| r.id).collect();
        info!("WIQL query matched {} work item(s)", ids.len());
        Ok(ids)
    }

    /// Fetch full records for the given ids, in batches of [`MAX_BATCH_IDS`].
    ///
    /// Returned records keep the order of `ids`. Batches are fetched
    /// sequentially; one invocation is a single snapshot, not a pipeline.
    pub async fn fetch_work_items(
        &self,
        ids: &[u64],
        show_progress: bool,
    ) -> Result<Vec<Value>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let progress = if show_progress {
            let pb = ProgressBar::new(ids.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} work items")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Some(pb)
        } else {
            None
        };

        let mut records = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH_IDS) {
            let id_list = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let url = format!(
                "{}/_apis/wit/workitems?ids={}&api-version={}",
                self.base_url, id_list, self.api_version
            );

            let response = self
                .http
                .get(&url)
                .basic_auth("", Some(&self.pat))
                .send()
                .await
                .map_err(|e| Error::Api(format!("work item fetch failed: {}", e)))?;

            let body: BatchResponse = Self::read_json(response).await?;
            if let Some(pb) = &progress {
                pb.inc(chunk.len() as u64);
            }
            records.extend(body.value);
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        debug!("Fetched {} work item record(s)", records.len());
        Ok(records)
    }

    /// List the team's iterations as sprint windows.
    ///
    /// `timeframe` maps to the API's `$timeframe` filter ("current",
    /// "past", "future"); `None` lists everything.
    pub async fn list_iterations(
        &self,
        timeframe: Option<&str>,
    ) -> Result<Vec<SprintWindow>, Error> {
        let mut url = format!(
            "{}/_apis/work/teamsettings/iterations?api-version={}",
            self.base_url, self.api_version
        );
        if let Some(frame) = timeframe {
            url.push_str(&format!("&$timeframe={}", frame));
        }

        let response = self
            .http
            .get(&url)
            .basic_auth("", Some(&self.pat))
            .send()
            .await
            .map_err(|e| Error::Api(format!("iterations request failed: {}", e)))?;

        let body: IterationsResponse = Self::read_json(response).await?;
        Ok(body
            .value
            .into_iter()
            .map(Iteration::into_sprint_window)
            .collect())
    }

    /// The currently running sprint, if the team has one.
    pub async fn current_sprint(&self) -> Result<Option<SprintWindow>, Error> {
        let mut sprints = self.list_iterations(Some("current")).await?;
        Ok(if sprints.is_empty() {
            None
        } else {
            Some(sprints.remove(0))
        })
    }

    /// Check the status line and deserialize the body.
    ///
    /// 401 becomes [`Error::Authentication`] so the caller can print a
    /// clean "Authentication failed" message instead of a JSON parse error.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, Error> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("HTTP {}: {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Api(format!("unexpected response body: {}", e)))
    }
}
