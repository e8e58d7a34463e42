use monitor_core::{export_jsonl, update, validate_envelope, Effect, EventLog, MonitorState, Msg};
use pretty_assertions::assert_eq;

const PAYLOADS: [&str; 3] = [
    r#"{"type":"stage","stage":"split","ts":"2025-01-01T00:00:00+00:00","fileId":"f1","message":"start split"}"#,
    r#"{"type":"progress","stage":"split","ts":"2025-01-01T00:00:01+00:00","fileId":"f1","percent":0.45}"#,
    r#"{"type":"completed","stage":"done","ts":"2025-01-01T00:00:02+00:00","fileId":"f1","message":"/tmp/result.xlsx"}"#,
];

#[test]
fn export_uses_sidecar_keys_one_line_per_event() {
    let mut log = EventLog::new();
    for raw in PAYLOADS {
        log.append(validate_envelope(raw).unwrap());
    }

    let text = export_jsonl(log.snapshot());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        r#"{"type":"progress","stage":"split","ts":"2025-01-01T00:00:01+00:00","fileId":"f1","percent":0.45}"#
    );
    assert!(text.ends_with('\n'));
}

#[test]
fn exported_log_reingests_to_the_same_events() {
    let mut log = EventLog::new();
    for raw in PAYLOADS {
        log.append(validate_envelope(raw).unwrap());
    }

    let mut reloaded = EventLog::new();
    for line in export_jsonl(log.snapshot()).lines() {
        reloaded.append(validate_envelope(line).unwrap());
    }

    assert_eq!(reloaded, log);
}

#[test]
fn empty_log_exports_empty_text() {
    assert_eq!(export_jsonl(&[]), "");
}

#[test]
fn copy_logs_exports_current_snapshot() {
    let (mut state, _) = update(MonitorState::new(), Msg::ListenerAttached);
    for raw in PAYLOADS {
        let (next, _) = update(state, Msg::SidecarPayload(raw.to_string()));
        state = next;
    }

    let (_state, effects) = update(state, Msg::CopyLogsClicked);
    match effects.as_slice() {
        [Effect::ExportLog { jsonl, event_count }] => {
            assert_eq!(*event_count, 3);
            assert_eq!(jsonl.lines().count(), 3);
        }
        other => panic!("unexpected effects {other:?}"),
    }
}
