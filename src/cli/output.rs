// Output formatting utilities

use crate::models::{CognateApp, DanglingReference};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Check if stdout is a TTY
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Serialize `value` as JSON, indented when `pretty`
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize output")
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

fn pad(text: &str, width: usize) -> String {
    let len = display_width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn truncate(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(2)).collect();
        format!("{}..", kept)
    }
}

/// Format the boards of a document as a table
///
/// One line per board with its title, column and syllable counts and the
/// doculects it covers. The doculect list is cut to fit `width`.
pub fn format_boards_table(app: &CognateApp, width: usize, tty: bool) -> String {
    if app.boards.is_empty() {
        return "No boards.".to_string();
    }

    struct Row {
        id: String,
        title: String,
        columns: String,
        syllables: String,
        doculects: String,
    }

    let rows: Vec<Row> = app
        .boards
        .values()
        .map(|board| {
            let mut syllables = 0;
            let mut doculects = BTreeSet::new();
            for column in board.column_ids.iter().filter_map(|id| app.columns.get(id)) {
                syllables += column.syllable_ids.len();
                doculects.extend(
                    column
                        .syllable_ids
                        .iter()
                        .filter_map(|id| app.syllables.get(id))
                        .map(|s| s.doculect.as_str()),
                );
            }
            Row {
                id: board.id.clone(),
                title: board.title.clone(),
                columns: board.column_ids.len().to_string(),
                syllables: syllables.to_string(),
                doculects: doculects.into_iter().collect::<Vec<_>>().join(" "),
            }
        })
        .collect();

    let id_width = rows.iter().map(|r| display_width(&r.id)).max().unwrap_or(0).max(5);
    let title_width = rows.iter().map(|r| display_width(&r.title)).max().unwrap_or(0).max(5);
    let columns_width = 7;
    let syllables_width = 9;
    let fixed = id_width + title_width + columns_width + syllables_width + 4;
    let doculects_width = width.saturating_sub(fixed).max(9);

    let header = format!(
        "{} {} {} {} {}",
        pad("Board", id_width),
        pad("Title", title_width),
        pad("Columns", columns_width),
        pad("Syllables", syllables_width),
        "Doculects"
    );
    let mut output = String::new();
    output.push_str(&bold_if_tty(header.trim_end(), tty));
    output.push('\n');
    output.push_str(&"-".repeat((fixed + doculects_width).min(width.max(fixed))));
    output.push('\n');

    for row in &rows {
        let line = format!(
            "{} {} {} {} {}",
            pad(&row.id, id_width),
            pad(&row.title, title_width),
            pad(&row.columns, columns_width),
            pad(&row.syllables, syllables_width),
            truncate(&row.doculects, doculects_width)
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    let unboarded = app.unboarded_columns().len();
    if unboarded > 0 {
        output.push_str(&format!("\n{} column(s) on no board\n", unboarded));
    }
    output
}

/// Format a referential integrity report
pub fn format_dangling_references(references: &[DanglingReference]) -> String {
    if references.is_empty() {
        return "No dangling references.".to_string();
    }
    let mut output = format!("{} dangling reference(s):\n", references.len());
    for reference in references {
        output.push_str(&format!("  {}\n", reference));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Column, Syllable, Word};

    fn app() -> CognateApp {
        let mut app = CognateApp::default();
        let word = Word {
            id: "word-1".to_string(),
            doculect: "Maru".to_string(),
            gloss: "fire".to_string(),
            glossid: "10".to_string(),
            syllables: vec!["mji⁵⁵".to_string()],
        };
        let syllable = Syllable::of_word(&word, 0).unwrap();
        let mut column = Column::new("column-1");
        column.syllable_ids.push(syllable.id.clone());
        app.syllables.insert(syllable.id.clone(), syllable);
        app.words.insert(word.id.clone(), word);
        app.columns.insert(column.id.clone(), column);
        app.columns.insert("column-2".to_string(), Column::new("column-2"));
        app.boards.insert(
            "board-1".to_string(),
            Board::new("board-1", "*mij", vec!["column-1".to_string()]),
        );
        app
    }

    #[test]
    fn test_format_boards_table() {
        let table = format_boards_table(&app(), 80, false);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Board"));
        assert!(lines[0].ends_with("Doculects"));
        assert!(lines[1].starts_with("-----"));
        assert!(lines[2].starts_with("board-1 *mij"));
        assert!(lines[2].ends_with("Maru"));
        assert!(table.contains("1 column(s) on no board"));
    }

    #[test]
    fn test_format_boards_table_empty() {
        assert_eq!(format_boards_table(&CognateApp::default(), 80, false), "No boards.");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("ŋaŋ ŋaj", 10), "ŋaŋ ŋaj");
        assert_eq!(truncate("Bola Maru Atsi", 9), "Bola Ma..");
    }

    #[test]
    fn test_to_json() {
        let compact = to_json(&app().boards, false).unwrap();
        assert!(compact.contains("\"columnIds\":[\"column-1\"]"));
        assert!(to_json(&app().boards, true).unwrap().contains('\n'));
    }
}
