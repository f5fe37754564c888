//! Attachments referenced by board actions.

use tracing::{debug, instrument, warn};
use url::Url;

use trellobackup_shared::{BoardDocument, Result, TrelloBackupError};

use crate::TrelloClient;

/// An attachment that can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDownload {
    pub id: String,
    pub name: String,
    pub url: Url,
}

/// Collect every attachment in `document`'s actions that has an id and a
/// resolvable `http`/`https` URL, in action order. Others are skipped.
pub fn attachment_downloads(document: &BoardDocument) -> Vec<AttachmentDownload> {
    document
        .actions
        .iter()
        .filter_map(|action| action.data.attachment.as_ref())
        .filter_map(|attachment| {
            if attachment.id.is_empty() {
                debug!("attachment without id, skipping");
                return None;
            }
            let url = attachment
                .url
                .as_deref()
                .and_then(|raw| Url::parse(raw).ok())
                .filter(|url| matches!(url.scheme(), "http" | "https"));
            match url {
                Some(url) => Some(AttachmentDownload {
                    id: attachment.id.clone(),
                    name: attachment.name.clone(),
                    url,
                }),
                None => {
                    debug!(id = %attachment.id, "attachment has no resolvable URL, skipping");
                    None
                }
            }
        })
        .collect()
}

impl TrelloClient {
    /// Download an attachment body verbatim.
    ///
    /// Credentials are not sent: attachment URLs point at arbitrary hosts.
    /// A non-success status is logged and its body returned anyway.
    #[instrument(skip_all, fields(host = attachment.url.host_str().unwrap_or_default()))]
    pub async fn download_attachment(&self, attachment: &AttachmentDownload) -> Result<Vec<u8>> {
        let url = &attachment.url;
        debug!(id = %attachment.id, path = url.path(), "downloading attachment");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TrelloBackupError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(id = %attachment.id, %status, "attachment download returned an error status");
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TrelloBackupError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}
