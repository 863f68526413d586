// src/detail.rs
use serde::Serialize;

pub const NO_DETAILS: &str = "No details available";

/// What a tracked entry contributes to a day's tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    pub description: String,
    pub project: String,
    pub task: String,
}

/// Builds the per-day tooltip text: one bullet per non-empty description,
/// in entry order. Falls back to [`NO_DETAILS`] for absent or empty input.
pub fn format_detail(entries: Option<&[DetailEntry]>) -> String {
    let lines: Vec<String> = entries
        .unwrap_or_default()
        .iter()
        .map(|e| e.description.trim())
        .filter(|d| !d.is_empty())
        .map(|d| format!("• {}", d))
        .collect();

    if lines.is_empty() {
        NO_DETAILS.to_string()
    } else {
        lines.join("\n")
    }
}
