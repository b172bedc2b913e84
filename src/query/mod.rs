//! Context-ranked autocomplete for the query panel.
//!
//! The engine only assists composition; finished queries go to the backend's
//! raw-query endpoint verbatim and are never validated here.

pub const KEYWORDS: [&str; 28] = [
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "LIKE", "ORDER", "BY", "GROUP", "HAVING",
    "LIMIT", "OFFSET", "AS", "COUNT", "SUM", "AVG", "MAX", "MIN", "DISTINCT", "JOIN", "INNER",
    "LEFT", "RIGHT", "ON", "UNION", "ALL",
];

pub const TABLES: [&str; 1] = ["logs"];

pub const FIELDS: [&str; 16] = [
    "id",
    "timestamp",
    "severity",
    "message",
    "device_type",
    "event_type",
    "event_category",
    "hostname",
    "appname",
    "raw_message",
    "parsed_fields",
    "priority",
    "facility",
    "version",
    "remote_addr",
    "protocol",
];

pub const OPERATORS: [&str; 13] = [
    "=", "!=", "<>", "<", ">", "<=", ">=", "LIKE", "NOT LIKE", "IN", "NOT IN", "IS NULL",
    "IS NOT NULL",
];

/// Hard cap on returned suggestions.
pub const MAX_SUGGESTIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Keyword,
    Table,
    Field,
    Operator,
}

impl SuggestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Table => "table",
            Self::Field => "field",
            Self::Operator => "operator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
}

fn candidates(kind: SuggestionKind, vocab: &[&str]) -> Vec<Suggestion> {
    vocab
        .iter()
        .map(|text| Suggestion {
            text: text.to_string(),
            kind,
        })
        .collect()
}

/// The word fragment immediately before the cursor, if any.
fn partial_word(before_cursor: &str) -> &str {
    let end = before_cursor.len();
    let start = before_cursor
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map(|i| i + 1)
        .unwrap_or(0);
    &before_cursor[start..end]
}

fn contains_token(haystack: &str, token: &str) -> bool {
    haystack
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word.eq_ignore_ascii_case(token))
}

/// Propose completions for the text before `cursor`.
///
/// Context rule, first match wins: after `select` (and before any `from`)
/// only fields; after `from` only table names; after `where`/`and`/`or`
/// fields plus comparison operators; otherwise keywords. Candidates are then
/// prefix-filtered (case-insensitively) by the partial word under the
/// cursor, kept in vocabulary order, and capped.
pub fn suggest(text: &str, cursor: usize) -> Vec<Suggestion> {
    let cursor = cursor.min(text.len());
    let before = &text[..cursor];

    let mut pool = if contains_token(before, "select") && !contains_token(before, "from") {
        candidates(SuggestionKind::Field, &FIELDS)
    } else if contains_token(before, "from") {
        candidates(SuggestionKind::Table, &TABLES)
    } else if contains_token(before, "where")
        || contains_token(before, "and")
        || contains_token(before, "or")
    {
        let mut pool = candidates(SuggestionKind::Field, &FIELDS);
        pool.extend(candidates(SuggestionKind::Operator, &OPERATORS));
        pool
    } else {
        candidates(SuggestionKind::Keyword, &KEYWORDS)
    };

    let partial = partial_word(before);
    if !partial.is_empty() {
        let partial = partial.to_lowercase();
        pool.retain(|s| s.text.to_lowercase().starts_with(&partial));
    }

    pool.truncate(MAX_SUGGESTIONS);
    pool
}

/// Splice a chosen suggestion over the partial word at `cursor`, returning
/// the new text and cursor position. A trailing space is appended so typing
/// can continue immediately.
pub fn apply_suggestion(text: &str, cursor: usize, suggestion: &str) -> (String, usize) {
    let cursor = cursor.min(text.len());
    let before = &text[..cursor];
    let after = &text[cursor..];
    let start = cursor - partial_word(before).len();

    let mut out = String::with_capacity(text.len() + suggestion.len() + 1);
    out.push_str(&text[..start]);
    out.push_str(suggestion);
    out.push(' ');
    let new_cursor = out.len();
    out.push_str(after);
    (out, new_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn empty_input_suggests_keywords_in_vocabulary_order() {
        let got = suggest("", 0);
        assert_eq!(got.len(), MAX_SUGGESTIONS);
        assert!(got.iter().all(|s| s.kind == SuggestionKind::Keyword));
        assert_eq!(got[0].text, "SELECT");
        assert_eq!(got[1].text, "FROM");
    }

    #[test]
    fn after_select_only_fields() {
        let got = suggest("SELECT ", 7);
        assert!(!got.is_empty());
        assert!(got.iter().all(|s| s.kind == SuggestionKind::Field));
        assert!(!texts(&got).contains(&"FROM"));
    }

    #[test]
    fn after_from_only_the_table() {
        let got = suggest("SELECT severity FROM ", 21);
        assert_eq!(texts(&got), vec!["logs"]);
        assert_eq!(got[0].kind, SuggestionKind::Table);
    }

    #[test]
    fn after_where_fields_and_operators() {
        let text = "SELECT * FROM logs WHERE ";
        let got = suggest(text, text.len());
        // "from" is also present, so the from-branch would win if checked
        // first; the where-branch must not be reachable here.
        assert_eq!(texts(&got), vec!["logs"]);

        // Without a from-token the where union applies.
        let text = "WHERE ";
        let got = suggest(text, text.len());
        assert!(got.iter().any(|s| s.kind == SuggestionKind::Field));
        assert!(got.iter().any(|s| s.kind == SuggestionKind::Operator));
    }

    #[test]
    fn partial_word_prefix_filters_case_insensitively() {
        let text = "SELECT sev";
        let got = suggest(text, text.len());
        assert_eq!(texts(&got), vec!["severity"]);

        let text = "se";
        let got = suggest(text, text.len());
        assert_eq!(texts(&got), vec!["SELECT"]);
    }

    #[test]
    fn select_token_must_be_a_whole_word() {
        // "selection" contains "select" as a substring but not as a token.
        let text = "selection ";
        let got = suggest(text, text.len());
        assert!(got.iter().all(|s| s.kind == SuggestionKind::Keyword));
    }

    #[test]
    fn cap_is_twenty() {
        let got = suggest("", 0);
        assert!(got.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn no_matches_is_an_empty_list() {
        let text = "SELECT zzz";
        assert!(suggest(text, text.len()).is_empty());
    }

    #[test]
    fn apply_suggestion_replaces_the_partial_word() {
        let (text, cursor) = apply_suggestion("SELECT sev", 10, "severity");
        assert_eq!(text, "SELECT severity ");
        assert_eq!(cursor, 16);

        let (text, cursor) = apply_suggestion("SELECT ", 7, "hostname");
        assert_eq!(text, "SELECT hostname ");
        assert_eq!(cursor, 16);
    }
}
