//! Trello REST client.
//!
//! This crate provides:
//! - [`TrelloClient`]: authenticated access to the listing and board-content endpoints
//! - [`BoardContent`]: a fetched board: raw body for persistence plus a typed view
//! - [`attachments`]: attachment references and direct downloads
//!
//! Requests are issued one at a time; callers await each before sending the next.

pub mod attachments;
mod board;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use trellobackup_shared::{
    BoardSummary, Credentials, Organization, Result, TrelloBackupError, TrelloConfig,
};

pub use attachments::{AttachmentDownload, attachment_downloads};
pub use board::BoardContent;

/// User-Agent string for API and attachment requests.
const USER_AGENT: &str = concat!("trellobackup/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow (attachment hosts redirect to CDNs).
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Client options
// ---------------------------------------------------------------------------

/// Settings for [`TrelloClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the REST API, e.g. `https://api.trello.com/1`.
    pub api_base_url: String,
    /// Ceiling on actions returned with a board.
    pub actions_limit: u32,
}

impl From<&TrelloConfig> for ClientOptions {
    fn from(config: &TrelloConfig) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            actions_limit: config.actions_limit,
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&TrelloConfig::default())
    }
}

// ---------------------------------------------------------------------------
// TrelloClient
// ---------------------------------------------------------------------------

/// Authenticated Trello API client.
pub struct TrelloClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    actions_limit: u32,
}

impl TrelloClient {
    /// Create a client. No request is sent until an endpoint method is called.
    pub fn new(credentials: Credentials, options: &ClientOptions) -> Result<Self> {
        let base_url = Url::parse(&options.api_base_url).map_err(|e| {
            TrelloBackupError::config(format!(
                "invalid api_base_url '{}': {e}",
                options.api_base_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TrelloBackupError::config(format!(
                "api_base_url '{base_url}' cannot be used as a base URL"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TrelloBackupError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            actions_limit: options.actions_limit,
        })
    }

    /// Boards the authenticated member belongs to.
    ///
    /// An empty or falsy response is an API error.
    #[instrument(skip_all)]
    pub async fn my_boards(&self) -> Result<Vec<BoardSummary>> {
        let body = self.get(&["members", "me", "boards"], &[]).await?;
        let value = require_non_empty(&body, "Error fetching boards.")?;
        decode(value, "board list")
    }

    /// Organizations the authenticated member belongs to. May be empty.
    #[instrument(skip_all)]
    pub async fn my_organizations(&self) -> Result<Vec<Organization>> {
        let body = self.get(&["members", "me", "organizations"], &[]).await?;
        let value = parse_json(&body, "Error fetching organizations.")?;
        if is_falsy(&value) {
            return Ok(Vec::new());
        }
        decode(value, "organization list")
    }

    /// Boards owned by one organization.
    ///
    /// An empty or falsy response is an API error.
    #[instrument(skip(self))]
    pub async fn organization_boards(&self, organization_id: &str) -> Result<Vec<BoardSummary>> {
        let body = self
            .get(&["organizations", organization_id, "boards"], &[])
            .await?;
        let value = require_non_empty(&body, "Error fetching organization boards.")?;
        decode(value, "organization board list")
    }

    /// Send an authenticated GET to `<base>/<segments...>` and return the body text.
    ///
    /// The status code is not checked here: Trello reports most failures as a
    /// plain-text body, which the callers turn into API errors that quote it.
    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TrelloBackupError::config("api_base_url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);

        debug!(path = url.path(), "GET");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("token", self.credentials.app_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                TrelloBackupError::Network(format!("{}: {}", url.path(), e.without_url()))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TrelloBackupError::Network(format!(
                "{}: failed to read body: {}",
                url.path(),
                e.without_url()
            ))
        })?;

        debug!(path = url.path(), %status, bytes = body.len(), "response received");
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Parse `body` as JSON; an unparsable body is an API error quoting it.
fn parse_json(body: &str, context: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|_| TrelloBackupError::api(format!("{context} {body}")))
}

/// Parse `body` and reject empty or falsy documents.
fn require_non_empty(body: &str, context: &str) -> Result<Value> {
    let value = parse_json(body, context)?;
    if is_falsy(&value) {
        return Err(TrelloBackupError::api(format!("{context} {body}")));
    }
    Ok(value)
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| TrelloBackupError::parse(format!("unexpected {what} shape: {e}")))
}

/// `null`, `false`, `0`, `""`, `[]` and `{}`.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
