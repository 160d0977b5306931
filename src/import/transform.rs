//! Field-level mapping from export records to Kanboard values.

/// Color of starred tasks.
pub const STARRED_COLOR: &str = "red";

/// Color of every other task (Kanboard's default).
pub const DEFAULT_COLOR: &str = "yellow";

pub fn color_for(starred: bool) -> &'static str {
    if starred { STARRED_COLOR } else { DEFAULT_COLOR }
}

/// Task description from an export note. Escaped `\n` sequences become
/// line breaks.
pub fn description_from_note(note: Option<&str>) -> String {
    note.map(|n| n.replace("\\n", "\n")).unwrap_or_default()
}

/// Checklist line representing a sub-task.
pub fn checklist_line(title: &str, completed: bool) -> String {
    let mark = if completed { 'X' } else { ' ' };
    format!("  - [{}] {}", mark, title)
}

/// Append a line to a description, starting a new line when it already
/// has content.
pub fn append_line(description: &str, line: &str) -> String {
    if description.is_empty() {
        line.to_string()
    } else {
        format!("{}\n{}", description, line)
    }
}
