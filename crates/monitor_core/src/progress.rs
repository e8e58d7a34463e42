use crate::Event;

/// Normalize a reported percent to the `[0, 100]` scale.
///
/// Readings `<= 1` are fractions, anything above is already a percentage. A
/// reading of exactly `1` therefore means 100%.
pub fn normalize_percent(raw: f64) -> f64 {
    if raw <= 1.0 {
        raw * 100.0
    } else {
        raw
    }
}

/// Global progress: the latest appended usable percent, normalized.
///
/// Returns `None` when nothing in the log carried a percent. Later readings
/// always win over earlier ones, so the value may drop when the sidecar starts
/// a new stage.
pub fn global_percent(events: &[Event]) -> Option<f64> {
    events
        .iter()
        .rev()
        .filter_map(Event::percent)
        .find(|raw| raw.is_finite())
        .map(normalize_percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_scale_to_percent() {
        assert_eq!(normalize_percent(0.0), 0.0);
        assert_eq!(normalize_percent(0.25), 25.0);
        assert_eq!(normalize_percent(1.0), 100.0);
        assert_eq!(normalize_percent(42.0), 42.0);
    }
}
