//! Comment transcripts for saved board backups.
//!
//! Turns a board JSON file written by `trellobackup backup` into a plain-text
//! transcript: the board header, then one paragraph per card that has
//! comments, with the comments in chronological order.
//!
//! ```text
//! Board
//! Board description
//!
//! Card name
//! Card description
//!     2023-01-01T09:00:00.000Z: first comment
//!     2023-01-02T10:30:00.000Z: reply
//!
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use trellobackup_shared::{BoardDocument, Result, TrelloBackupError};

const JSON_EXTENSION: &str = ".json";
const TEXT_EXTENSION: &str = ".txt";
const COMMENT_INDENT: &str = "    ";

/// Convert the board document at `json_path` and write the transcript next to
/// it (`board.json` → `board.txt`). Returns the transcript path.
#[instrument(skip_all, fields(path = %json_path.display()))]
pub fn convert_file(json_path: &Path) -> Result<PathBuf> {
    let txt_path = transcript_path(json_path)?;

    let content =
        std::fs::read_to_string(json_path).map_err(|e| TrelloBackupError::io(json_path, e))?;
    let document = parse_document(&content)?;
    let transcript = render_transcript(&document);

    std::fs::write(&txt_path, &transcript).map_err(|e| TrelloBackupError::io(&txt_path, e))?;

    info!(
        output = %txt_path.display(),
        bytes = transcript.len(),
        "transcript written"
    );

    Ok(txt_path)
}

/// The transcript path for `json_path`: its trailing `.json` (any case)
/// replaced by `.txt`. Anything else is an input error.
pub fn transcript_path(json_path: &Path) -> Result<PathBuf> {
    let not_json = || {
        TrelloBackupError::input(format!("{} is not a JSON file", json_path.display()))
    };

    let raw = json_path.to_str().ok_or_else(not_json)?;
    let split = raw.len().checked_sub(JSON_EXTENSION.len()).ok_or_else(not_json)?;
    let (stem, ext) = (raw.get(..split), raw.get(split..));

    match (stem, ext) {
        (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(JSON_EXTENSION) => {
            Ok(PathBuf::from(format!("{stem}{TEXT_EXTENSION}")))
        }
        _ => Err(not_json()),
    }
}

/// Parse a saved board document.
pub fn parse_document(content: &str) -> Result<BoardDocument> {
    serde_json::from_str(content)
        .map_err(|e| TrelloBackupError::parse(format!("invalid board document: {e}")))
}

/// Render the transcript for `document`.
///
/// Cards without comments are left out. Comments are sorted by timestamp,
/// then by text when timestamps are equal.
pub fn render_transcript(document: &BoardDocument) -> String {
    let mut comments: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
    for action in &document.actions {
        if let Some((card_id, date, text)) = action.comment() {
            comments.entry(card_id).or_default().push((date, text));
        } else if action.data.text.is_some() {
            debug!(action = %action.id, "comment without card reference, skipping");
        }
    }

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write!(out, "{}\n{}\n\n", document.name, document.desc);

    for card in &document.cards {
        let Some(card_comments) = comments.get_mut(card.id.as_str()) else {
            continue;
        };
        card_comments.sort();

        let _ = writeln!(out, "{}\n{}", card.name, card.desc);
        for (date, text) in card_comments.iter() {
            let _ = writeln!(out, "{COMMENT_INDENT}{date}: {text}");
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SCENARIO: &str = r#"{"name":"Board","desc":"D","cards":[{"id":"c1","name":"Card1","desc":"d1"}],"actions":[{"date":"2023-01-02","data":{"text":"hello","card":{"id":"c1"}}},{"date":"2023-01-01","data":{"text":"hi","card":{"id":"c1"}}}]}"#;

    fn render(json: &str) -> String {
        render_transcript(&parse_document(json).unwrap())
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tb-{tag}-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn renders_comments_in_chronological_order() {
        assert_eq!(
            render(SCENARIO),
            "Board\nD\n\nCard1\nd1\n    2023-01-01: hi\n    2023-01-02: hello\n\n"
        );
    }

    #[test]
    fn empty_actions_render_header_only() {
        let json = r#"{"name":"Board","desc":"D","cards":[{"id":"c1","name":"Card1","desc":"d1"}],"actions":[]}"#;
        assert_eq!(render(json), "Board\nD\n\n");
    }

    #[test]
    fn cards_without_comments_are_omitted() {
        let json = r#"{
            "name": "Board", "desc": "",
            "cards": [
                {"id": "c1", "name": "Quiet", "desc": "no comments"},
                {"id": "c2", "name": "Chatty", "desc": ""}
            ],
            "actions": [
                {"date": "2023-03-01", "data": {"text": "ping", "card": {"id": "c2"}}},
                {"date": "2023-03-02", "data": {"card": {"id": "c1"}, "listAfter": {"id": "l2"}}}
            ]
        }"#;
        let transcript = render(json);
        assert!(!transcript.contains("Quiet"));
        assert_eq!(transcript, "Board\n\n\nChatty\n\n    2023-03-01: ping\n\n");
    }

    #[test]
    fn equal_timestamps_sort_by_text() {
        let json = r#"{
            "name": "B", "desc": "",
            "cards": [{"id": "c1", "name": "C", "desc": ""}],
            "actions": [
                {"date": "2023-01-01", "data": {"text": "zebra", "card": {"id": "c1"}}},
                {"date": "2023-01-01", "data": {"text": "apple", "card": {"id": "c1"}}},
                {"date": "2022-12-31", "data": {"text": "older", "card": {"id": "c1"}}}
            ]
        }"#;
        let transcript = render(json);
        let lines: Vec<&str> = transcript.lines().filter(|l| l.starts_with("    ")).collect();
        assert_eq!(
            lines,
            vec![
                "    2022-12-31: older",
                "    2023-01-01: apple",
                "    2023-01-01: zebra",
            ]
        );
    }

    #[test]
    fn cards_follow_document_order() {
        let json = r#"{
            "name": "B", "desc": "",
            "cards": [{"id": "c2", "name": "Second", "desc": ""}, {"id": "c1", "name": "First", "desc": ""}],
            "actions": [
                {"date": "2023-01-01", "data": {"text": "a", "card": {"id": "c1"}}},
                {"date": "2023-01-01", "data": {"text": "b", "card": {"id": "c2"}}}
            ]
        }"#;
        let transcript = render(json);
        let second = transcript.find("Second").unwrap();
        let first = transcript.find("First").unwrap();
        assert!(second < first);
    }

    #[test]
    fn transcript_path_requires_json_extension() {
        assert_eq!(
            transcript_path(Path::new("backups/run/board.json")).unwrap(),
            PathBuf::from("backups/run/board.txt")
        );
        assert_eq!(
            transcript_path(Path::new("BOARD.JSON")).unwrap(),
            PathBuf::from("BOARD.txt")
        );

        for bad in ["board.txt", "json", "", "board.json.bak"] {
            let err = transcript_path(Path::new(bad)).unwrap_err();
            assert!(matches!(err, TrelloBackupError::Input { .. }), "{bad:?}");
        }
    }

    #[test]
    fn convert_file_is_idempotent() {
        let dir = temp_dir("transcript");
        let json_path = dir.join("org-unknown-board-Board.json");
        std::fs::write(&json_path, SCENARIO).unwrap();

        let txt_path = convert_file(&json_path).unwrap();
        assert_eq!(txt_path, dir.join("org-unknown-board-Board.txt"));
        let first = std::fs::read(&txt_path).unwrap();

        convert_file(&json_path).unwrap();
        let second = std::fs::read(&txt_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "Board\nD\n\nCard1\nd1\n    2023-01-01: hi\n    2023-01-02: hello\n\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn convert_file_rejects_non_json_before_reading() {
        let err = convert_file(Path::new("/definitely/missing/notes.md")).unwrap_err();
        assert!(matches!(err, TrelloBackupError::Input { .. }));
    }

    #[test]
    fn invalid_document_is_parse_error() {
        let dir = temp_dir("transcript-invalid");
        let json_path = dir.join("broken.json");
        std::fs::write(&json_path, "{ not json").unwrap();

        let err = convert_file(&json_path).unwrap_err();
        assert!(matches!(err, TrelloBackupError::Parse { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
