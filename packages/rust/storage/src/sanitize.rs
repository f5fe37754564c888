//! Filesystem-safe file names.
//!
//! Every name the writer persists goes through [`sanitize_file_name`], so board
//! and organization names typed by users can never escape the backup folder or
//! produce names Windows refuses to create.

use std::sync::LazyLock;

use regex::Regex;

/// Longest file name (in bytes) most filesystems accept.
const MAX_NAME_BYTES: usize = 255;

/// Device names Windows reserves regardless of extension handling.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make `name` safe to use as a single path component.
///
/// Removes path separators, characters Windows forbids, and control
/// characters; trims trailing dots and spaces; guards reserved and empty
/// names; and truncates to 255 bytes while keeping the extension.
/// Sanitizing an already sanitized name returns it unchanged.
pub fn sanitize_file_name(name: &str) -> String {
    static UNSAFE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"[\x00-\x1F\\/:*?"<>|]"#).expect("valid regex"));

    let cleaned = UNSAFE_RE.replace_all(name, "");
    let mut result = cleaned
        .trim_end_matches(['.', ' '])
        .trim()
        .to_string();

    if result.chars().all(|c| c == '.') {
        result = format!("__{result}");
    }
    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(&result))
    {
        result = format!("__{result}");
    }

    if result.len() > MAX_NAME_BYTES {
        result = truncate_keeping_extension(&result);
    }

    result
}

fn truncate_keeping_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() + 1 < MAX_NAME_BYTES => {
            let budget = MAX_NAME_BYTES - ext.len() - 1;
            format!("{}.{ext}", truncate_at_char_boundary(stem, budget))
        }
        _ => truncate_at_char_boundary(name, MAX_NAME_BYTES)
            .trim_end_matches(['.', ' '])
            .to_string(),
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// File name for a board backup: `org-<org>-board-<board>.json`.
pub fn board_file_name(organization: &str, board: &str) -> String {
    sanitize_file_name(&format!("org-{organization}-board-{board}.json"))
}

/// File name for a downloaded attachment: `attachment-<id>-<name>`.
pub fn attachment_file_name(id: &str, name: &str) -> String {
    sanitize_file_name(&format!("attachment-{id}-{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_safe(name: &str) {
        assert!(!name.is_empty());
        assert!(name.len() <= MAX_NAME_BYTES);
        for c in ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0', '\n'] {
            assert!(!name.contains(c), "{name:?} contains {c:?}");
        }
        assert!(!name.ends_with('.') && !name.ends_with(' '));
    }

    #[test]
    fn strips_unsafe_characters() {
        assert_eq!(sanitize_file_name("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_file_name("tab\there\nnewline"), "tabherenewline");
    }

    #[test]
    fn run_timestamp_loses_colons() {
        assert_eq!(sanitize_file_name("2024-05-01 10:30:00"), "2024-05-01 103000");
    }

    #[test]
    fn trims_trailing_dots_and_spaces() {
        assert_eq!(sanitize_file_name("  notes. . "), "notes");
        assert_eq!(sanitize_file_name("report.txt"), "report.txt");
    }

    #[test]
    fn guards_empty_dot_and_reserved_names() {
        assert_eq!(sanitize_file_name(""), "__");
        assert_eq!(sanitize_file_name("///"), "__");
        assert_eq!(sanitize_file_name(".."), "__");
        assert_eq!(sanitize_file_name("CON"), "__CON");
        assert_eq!(sanitize_file_name("lpt1"), "__lpt1");
        assert_eq!(sanitize_file_name("CONSOLE"), "CONSOLE");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let long = format!("{}.json", "é".repeat(200));
        let sanitized = sanitize_file_name(&long);
        assert!(sanitized.len() <= MAX_NAME_BYTES);
        assert!(sanitized.ends_with(".json"));
        assert_safe(&sanitized);
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for raw in [
            "org-Acme: Inc.-board-Q1/Q2 plans?.json",
            "attachment-5f1-screen shot <final>.png",
            &"x".repeat(400),
            "   ",
            "NUL",
        ] {
            let once = sanitize_file_name(raw);
            assert_eq!(sanitize_file_name(&once), once, "not idempotent for {raw:?}");
            assert_safe(&once);
        }
    }

    #[test]
    fn board_and_attachment_names() {
        assert_eq!(
            board_file_name("Acme/Team", "Road: map"),
            "org-AcmeTeam-board-Road map.json"
        );
        assert_eq!(
            attachment_file_name("5f1a", "diagram?.png"),
            "attachment-5f1a-diagram.png"
        );
        assert_safe(&board_file_name("unknown", "../../etc/passwd"));
    }
}
