//! Board content retrieval.

use tracing::{info, instrument};

use trellobackup_shared::{BoardDocument, BoardSummary, Result};

use crate::{TrelloClient, decode, require_non_empty};

/// A fetched board.
#[derive(Debug, Clone)]
pub struct BoardContent {
    /// Response body exactly as Trello sent it; this is what gets backed up.
    pub raw: String,
    /// Typed view used to find attachments and comments.
    pub document: BoardDocument,
}

impl TrelloClient {
    /// Fetch the full content of `board` in a single request: actions (up to
    /// the configured ceiling), cards, lists, members, checklists, and
    /// attachment fields.
    #[instrument(skip_all, fields(board_id = %board.id))]
    pub async fn fetch_board(&self, board: &BoardSummary) -> Result<BoardContent> {
        let query = [
            ("actions", "all".to_string()),
            ("actions_limit", self.actions_limit.to_string()),
            ("card_attachment_fields", "all".to_string()),
            ("cards", "all".to_string()),
            ("lists", "all".to_string()),
            ("members", "all".to_string()),
            ("member_fields", "all".to_string()),
            ("checklists", "all".to_string()),
            ("fields", "all".to_string()),
        ];
        let body = self.get(&["boards", board.id.as_str()], &query).await?;

        let context = format!("Error fetching the content of board \"{}\".", board.name);
        let value = require_non_empty(&body, &context)?;
        let document: BoardDocument = decode(value, "board document")?;

        info!(
            name = %board.name,
            cards = document.cards.len(),
            actions = document.actions.len(),
            bytes = body.len(),
            "board content fetched"
        );

        Ok(BoardContent {
            raw: body,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::client_for;
    use trellobackup_shared::TrelloBackupError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summary(id: &str, name: &str) -> BoardSummary {
        BoardSummary {
            id: id.into(),
            name: name.into(),
            id_organization: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_board_requests_every_field_group() {
        let server = MockServer::start().await;
        let body = r#"{"id":"b1","name":"Todo","desc":"","cards":[{"id":"c1","name":"Card"}],"actions":[],"lists":[],"members":[],"checklists":[]}"#;

        Mock::given(method("GET"))
            .and(path("/boards/b1"))
            .and(query_param("actions", "all"))
            .and(query_param("actions_limit", "1000"))
            .and(query_param("cards", "all"))
            .and(query_param("lists", "all"))
            .and(query_param("members", "all"))
            .and(query_param("member_fields", "all"))
            .and(query_param("checklists", "all"))
            .and(query_param("card_attachment_fields", "all"))
            .and(query_param("fields", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .fetch_board(&summary("b1", "Todo"))
            .await
            .unwrap();

        // Raw body is kept byte for byte.
        assert_eq!(content.raw, body);
        assert_eq!(content.document.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_board_empty_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/boards/b1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_board(&summary("b1", "Roadmap"))
            .await
            .unwrap_err();

        assert!(matches!(err, TrelloBackupError::Api { .. }));
        assert!(
            err.to_string()
                .contains("Error fetching the content of board \"Roadmap\". {}")
        );
    }
}
