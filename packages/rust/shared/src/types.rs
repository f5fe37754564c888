//! Trello domain types.
//!
//! Only the fields trellobackup reads are modelled; everything else in the
//! API responses is ignored on parse and preserved verbatim on disk, since
//! backups are written from the raw response body.

use serde::{Deserialize, Deserializer, Serialize};

/// Trello sends `null` for many absent strings and lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Listing endpoints
// ---------------------------------------------------------------------------

/// A board as returned by the board-listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Owning organization, `None` for personal boards.
    #[serde(rename = "idOrganization", default)]
    pub id_organization: Option<String>,
}

/// A Trello organization (team / workspace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(rename = "displayName", default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Board content
// ---------------------------------------------------------------------------

/// Typed view over a full board document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<Card>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
}

/// An entry in a board's activity log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Action type, e.g. `commentCard` or `addAttachmentToCard`.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    /// ISO 8601 timestamp as sent by Trello. Kept as a string so transcripts
    /// sort and print exactly what the API returned.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: ActionData,
}

/// The payload of an action. Only the comment and attachment shapes matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Action {
    /// The `(card id, date, text)` of a comment action, if this is one.
    pub fn comment(&self) -> Option<(&str, &str, &str)> {
        let text = self.data.text.as_deref()?;
        let card = self.data.card.as_ref()?;
        Some((card.id.as_str(), self.date.as_str(), text))
    }
}
