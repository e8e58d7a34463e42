use monitor_logging::monitor_warn;

use crate::Event;

/// Render events as JSON Lines, one event per line, in log order.
pub fn export_jsonl(events: &[Event]) -> String {
    let mut out = String::new();
    for (index, event) in events.iter().enumerate() {
        match serde_json::to_string(event) {
            Ok(line) => {
                out.push_str(&line);
                out.push('\n');
            }
            Err(err) => {
                monitor_warn!("Skipping event {} in export: {}", index, err);
            }
        }
    }
    out
}
