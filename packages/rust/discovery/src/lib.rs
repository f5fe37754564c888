//! Board discovery.
//!
//! Before any board content is fetched, trellobackup enumerates every board the
//! member can see: their own boards plus the boards of each organization they
//! belong to. The organization label table is built in the same pass and is
//! not consulted against the API again for the rest of the run.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use trellobackup_client::TrelloClient;
use trellobackup_shared::{BoardSummary, Organization, Result};

/// Label for boards that do not belong to an organization.
pub const UNKNOWN_ORGANIZATION: &str = "unknown";

// ---------------------------------------------------------------------------
// BoardInventory
// ---------------------------------------------------------------------------

/// Every board visible to the member, with organization names for labeling.
#[derive(Debug, Clone, Default)]
pub struct BoardInventory {
    /// Boards in discovery order, each id at most once.
    pub boards: Vec<BoardSummary>,
    /// Organization id → display name.
    pub organizations: HashMap<String, String>,
}

impl BoardInventory {
    /// Build an inventory, dropping repeated board ids (first one wins).
    pub fn new(boards: Vec<BoardSummary>, organizations: &[Organization]) -> Self {
        let mut seen = HashSet::new();
        let boards = boards
            .into_iter()
            .filter(|board| seen.insert(board.id.clone()))
            .collect();

        let organizations = organizations
            .iter()
            .map(|org| (org.id.clone(), org.display_name.clone()))
            .collect();

        Self {
            boards,
            organizations,
        }
    }

    /// The organization label used in file names and progress output.
    ///
    /// Known organizations resolve to their display name, unknown ids fall
    /// back to the id itself, and boards without an organization get
    /// [`UNKNOWN_ORGANIZATION`].
    pub fn organization_label<'a>(&'a self, board: &'a BoardSummary) -> &'a str {
        match board.id_organization.as_deref() {
            None => UNKNOWN_ORGANIZATION,
            Some(id) => self
                .organizations
                .get(id)
                .map(String::as_str)
                .unwrap_or(id),
        }
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Enumerate all boards reachable by the authenticated member.
///
/// 1. Personal boards (an empty list is an API error)
/// 2. Each organization's boards (an empty list is an API error)
/// 3. Organization label table
#[instrument(skip_all)]
pub async fn enumerate_boards(client: &TrelloClient) -> Result<BoardInventory> {
    let mut boards = client.my_boards().await?;
    debug!(count = boards.len(), "personal boards listed");

    let organizations = client.my_organizations().await?;
    for org in &organizations {
        let org_boards = client.organization_boards(&org.id).await?;
        debug!(org = %org.display_name, count = org_boards.len(), "organization boards listed");
        boards.extend(org_boards);
    }

    let inventory = BoardInventory::new(boards, &organizations);

    info!(
        boards = inventory.len(),
        organizations = organizations.len(),
        "boards enumerated"
    );

    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellobackup_client::ClientOptions;
    use trellobackup_shared::{Credentials, TrelloBackupError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn board(id: &str, name: &str, org: Option<&str>) -> BoardSummary {
        BoardSummary {
            id: id.into(),
            name: name.into(),
            id_organization: org.map(String::from),
        }
    }

    fn client_for(server: &MockServer) -> TrelloClient {
        let options = ClientOptions {
            api_base_url: server.uri(),
            actions_limit: 1000,
        };
        let creds = Credentials::new(
            "0123456789abcdef0123456789abcdef",
            "fedcba9876543210fedcba9876543210fedcba9876543210",
        );
        TrelloClient::new(creds, &options).unwrap()
    }

    async fn mount(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_organization_labels() {
        let orgs = vec![Organization {
            id: "o1".into(),
            display_name: "Acme".into(),
        }];
        let inventory = BoardInventory::new(
            vec![
                board("b1", "Personal", None),
                board("b2", "Team", Some("o1")),
                board("b3", "Guest", Some("o-foreign")),
            ],
            &orgs,
        );

        let labels: Vec<&str> = inventory
            .boards
            .iter()
            .map(|b| inventory.organization_label(b))
            .collect();
        assert_eq!(labels, vec![UNKNOWN_ORGANIZATION, "Acme", "o-foreign"]);
    }

    #[test]
    fn test_duplicate_boards_are_kept_once() {
        let inventory = BoardInventory::new(
            vec![
                board("b1", "Team", Some("o1")),
                board("b2", "Other", None),
                board("b1", "Team", Some("o1")),
            ],
            &[],
        );
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.boards[0].id, "b1");
        assert_eq!(inventory.boards[1].id, "b2");
    }

    #[tokio::test]
    async fn test_enumerate_personal_and_organization_boards() {
        let server = MockServer::start().await;

        mount(
            &server,
            "/members/me/boards",
            r#"[{"id":"b1","name":"Personal","idOrganization":null}]"#,
        )
        .await;
        mount(
            &server,
            "/members/me/organizations",
            r#"[{"id":"o1","displayName":"Acme"}]"#,
        )
        .await;
        mount(
            &server,
            "/organizations/o1/boards",
            r#"[{"id":"b2","name":"Roadmap","idOrganization":"o1"}]"#,
        )
        .await;

        let inventory = enumerate_boards(&client_for(&server)).await.unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.organization_label(&inventory.boards[0]), "unknown");
        assert_eq!(inventory.organization_label(&inventory.boards[1]), "Acme");
    }

    #[tokio::test]
    async fn test_empty_personal_boards_fails_before_organizations() {
        let server = MockServer::start().await;

        mount(&server, "/members/me/boards", "[]").await;

        Mock::given(method("GET"))
            .and(path("/members/me/organizations"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(0)
            .mount(&server)
            .await;

        let err = enumerate_boards(&client_for(&server)).await.unwrap_err();
        assert!(matches!(err, TrelloBackupError::Api { .. }));
    }

    #[tokio::test]
    async fn test_empty_organization_boards_is_api_error() {
        let server = MockServer::start().await;

        mount(
            &server,
            "/members/me/boards",
            r#"[{"id":"b1","name":"Personal","idOrganization":null}]"#,
        )
        .await;
        mount(
            &server,
            "/members/me/organizations",
            r#"[{"id":"o1","displayName":"Acme"}]"#,
        )
        .await;
        mount(&server, "/organizations/o1/boards", "[]").await;

        let err = enumerate_boards(&client_for(&server)).await.unwrap_err();
        assert!(matches!(err, TrelloBackupError::Api { .. }));
        assert!(err.to_string().contains("Error fetching organization boards. []"));
    }
}
