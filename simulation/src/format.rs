//! Console rendering of replica state

use std::fmt::Write;

use replog_core::ReplicaState;

/// Render a replica's log and time table the way `PrintState` shows them.
///
/// ```text
/// Log: {"increment(X)", "decrement(Y)"}
/// TimeTable:
/// | 1 | 0 | 0 |
/// | 0 | 0 | 0 |
/// | 0 | 0 | 0 |
/// ```
pub fn format_state(state: &ReplicaState) -> String {
    let entries: Vec<String> = state
        .log
        .iter()
        .map(|entry| format!("\"{}({})\"", entry.kind, entry.key))
        .collect();

    let mut out = format!("Log: {{{}}}\nTimeTable:", entries.join(", "));
    for row in &state.time_table {
        out.push_str("\n|");
        for cell in row {
            let _ = write!(out, " {cell} |");
        }
    }
    out
}

/// Render a query result; absent keys print as `null`.
pub fn format_value(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}
