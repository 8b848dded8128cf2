//! SQL script splitting and statement classification.
//!
//! [`StatementSplitter`] walks a script and yields one statement per `;`
//! that sits outside string literals, quoted identifiers and comments.
//! Comments are dropped from the yielded text.

pub mod insert;

use once_cell::sync::Lazy;
use regex::Regex;

pub use insert::{InsertParser, InsertStatement, Literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    Insert,
    CreateIndex,
    AlterTable,
    DropTable,
}

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?"?([^\s"(;]+)"?"#)
        .unwrap()
});

static INSERT_INTO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*INSERT\s+INTO\s+"?([^\s"(;]+)"?"#).unwrap());

static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:UNIQUE\s+)?INDEX\s+.*?\bON\s+"?([^\s"(;]+)"?"#).unwrap()
});

static ALTER_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*ALTER\s+TABLE\s+"?([^\s";]+)"?"#).unwrap());

static DROP_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?"?([^\s";]+)"?"#).unwrap()
});

/// Classify a statement and extract the table it targets.
pub fn parse_statement(stmt: &str) -> (StatementType, String) {
    let patterns: [(&Lazy<Regex>, StatementType); 5] = [
        (&CREATE_TABLE_RE, StatementType::CreateTable),
        (&INSERT_INTO_RE, StatementType::Insert),
        (&CREATE_INDEX_RE, StatementType::CreateIndex),
        (&ALTER_TABLE_RE, StatementType::AlterTable),
        (&DROP_TABLE_RE, StatementType::DropTable),
    ];

    for (re, kind) in patterns {
        if let Some(m) = re.captures(stmt).and_then(|caps| caps.get(1)) {
            return (kind, m.as_str().to_string());
        }
    }

    (StatementType::Unknown, String::new())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

/// Iterator over the statements of a SQL script.
///
/// Quotes are toggled on every quote character, so doubled quotes (`''`,
/// `""`) stay inside the literal. Backslash is an ordinary character.
pub struct StatementSplitter<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> StatementSplitter<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Scan one raw statement starting at `self.pos`, without its terminator
    fn scan(&mut self) -> String {
        let input = &self.src[self.pos..];
        let mut out = String::new();
        let mut state = ScanState::Normal;
        let mut chars = input.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match state {
                ScanState::Normal => match c {
                    ';' => {
                        self.pos += i + 1;
                        return out;
                    }
                    '\'' => {
                        state = ScanState::SingleQuote;
                        out.push(c);
                    }
                    '"' => {
                        state = ScanState::DoubleQuote;
                        out.push(c);
                    }
                    '-' if matches!(chars.peek(), Some((_, '-'))) => {
                        chars.next();
                        state = ScanState::LineComment;
                    }
                    '/' if matches!(chars.peek(), Some((_, '*'))) => {
                        chars.next();
                        state = ScanState::BlockComment;
                    }
                    _ => out.push(c),
                },
                ScanState::SingleQuote => {
                    out.push(c);
                    if c == '\'' {
                        state = ScanState::Normal;
                    }
                }
                ScanState::DoubleQuote => {
                    out.push(c);
                    if c == '"' {
                        state = ScanState::Normal;
                    }
                }
                ScanState::LineComment => {
                    if c == '\n' {
                        out.push('\n');
                        state = ScanState::Normal;
                    }
                }
                ScanState::BlockComment => {
                    if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        out.push(' ');
                        state = ScanState::Normal;
                    }
                }
            }
        }

        self.pos = self.src.len();
        out
    }
}

impl Iterator for StatementSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.src.len() {
            let raw = self.scan();
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        None
    }
}

/// Split a script into trimmed, non-empty statements.
pub fn split_statements(sql: &str) -> Vec<String> {
    StatementSplitter::new(sql).collect()
}

/// Single-line prefix of a statement for diagnostics.
///
/// Whitespace runs collapse to one space; the cut never splits a character.
pub fn preview(stmt: &str, max_chars: usize) -> String {
    let flat = stmt.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => flat[..idx].to_string(),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let stmts = split_statements("CREATE TABLE a (id INT);\nINSERT INTO a VALUES (1);\n");
        assert_eq!(stmts, vec!["CREATE TABLE a (id INT)", "INSERT INTO a VALUES (1)"]);
    }

    #[test]
    fn test_semicolon_inside_string() {
        let stmts = split_statements("INSERT INTO t VALUES ('a;b'); SELECT 1;");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "INSERT INTO t VALUES ('a;b')");
    }

    #[test]
    fn test_doubled_quote_stays_in_literal() {
        let stmts = split_statements("INSERT INTO t VALUES ('O''Brien;x'); SELECT 2");
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('O''Brien;x')", "SELECT 2"]);
    }

    #[test]
    fn test_quoted_identifier() {
        let stmts = split_statements(r#"SELECT "weird;name" FROM t; SELECT 1;"#);
        assert_eq!(stmts[0], r#"SELECT "weird;name" FROM t"#);
    }

    #[test]
    fn test_comments_stripped() {
        let sql = "-- header; with semicolon\nSELECT 1; /* block ; comment */ SELECT 2;\n-- trailing only\n";
        let stmts = split_statements(sql);
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_comment_markers_inside_string_kept() {
        let stmts = split_statements("INSERT INTO t VALUES ('--not a comment', '/*x*/');");
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('--not a comment', '/*x*/')"]);
    }

    #[test]
    fn test_empty_fragments_skipped() {
        assert!(split_statements(" ;; \n ; ").is_empty());
        assert!(split_statements("").is_empty());
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        let stmts = split_statements("SELECT 1;\nSELECT 2");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_parse_statement_kinds() {
        assert_eq!(
            parse_statement("CREATE TABLE IF NOT EXISTS dim_date (k INT)"),
            (StatementType::CreateTable, "dim_date".to_string())
        );
        assert_eq!(
            parse_statement("insert into patients (id) VALUES (1)"),
            (StatementType::Insert, "patients".to_string())
        );
        assert_eq!(
            parse_statement("CREATE UNIQUE INDEX idx_mrn ON patients (mrn)"),
            (StatementType::CreateIndex, "patients".to_string())
        );
        assert_eq!(
            parse_statement("DROP TABLE IF EXISTS billing"),
            (StatementType::DropTable, "billing".to_string())
        );
        assert_eq!(
            parse_statement("ALTER TABLE billing ADD COLUMN x INT"),
            (StatementType::AlterTable, "billing".to_string())
        );
        assert_eq!(parse_statement("SELECT 1").0, StatementType::Unknown);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("INSERT INTO t\n  VALUES (1)", 50), "INSERT INTO t VALUES (1)");
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("ééééé", 2), "éé");
    }
}
