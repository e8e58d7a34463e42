use std::sync::Once;

use monitor_core::{update, ChannelStatus, Effect, MonitorState, Msg, NotificationLevel};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(monitor_logging::initialize_for_tests);
}

fn attached() -> MonitorState {
    let (state, effects) = update(MonitorState::new(), Msg::ListenerAttached);
    assert!(effects.is_empty());
    state
}

fn deliver(state: MonitorState, raw: &str) -> (MonitorState, Vec<Effect>) {
    update(state, Msg::SidecarPayload(raw.to_string()))
}

fn interrupts(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::ShowErrorDialog { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn end_to_end_stage_progress_error_completed() {
    init_logging();
    let payloads = [
        r#"{"type":"stage","stage":"parse","ts":"2025-01-01T00:00:00+00:00","fileId":"f1","percent":0.1}"#,
        r#"{"type":"progress","stage":"parse","ts":"2025-01-01T00:00:01+00:00","fileId":"f1","percent":0.5}"#,
        r#"{"type":"error","stage":"parse","ts":"2025-01-01T00:00:02+00:00","fileId":"f1","message":"OCR failed"}"#,
        r#"{"type":"completed","stage":"done","ts":"2025-01-01T00:00:03+00:00","fileId":"f1","percent":1}"#,
    ];

    let mut state = attached();
    let mut all_interrupts = Vec::new();
    for raw in payloads {
        let (next, effects) = deliver(state, raw);
        all_interrupts.extend(interrupts(&effects));
        state = next;
    }

    let view = state.view();
    assert_eq!(view.event_count, 4);
    assert_eq!(view.global_percent, Some(100.0));
    assert_eq!(all_interrupts, vec!["OCR failed".to_string()]);
    assert_eq!(view.interrupt_count, 1);
    assert_eq!(view.error_dialog.as_deref(), Some("OCR failed"));
}

#[test]
fn malformed_payloads_never_grow_the_log() {
    init_logging();
    let mut state = attached();
    let payloads = [
        r#"{"type":"stage","stage":"split","ts":"t","fileId":"f"}"#,
        "{not json",
        r#"{"type":"stage","stage":"split","ts":"t"}"#,
        r#"{"type":"explode","stage":"split","ts":"t","fileId":"f"}"#,
        r#"{"type":"progress","stage":"split","ts":"t","fileId":"f","percent":0.5}"#,
        "",
    ];

    for raw in payloads {
        let (mut next, effects) = deliver(state, raw);
        assert!(effects.is_empty());
        let _ = next.consume_dirty();
        state = next;
    }

    assert_eq!(state.event_count(), 2);
    assert_eq!(state.rejected_count(), 4);
}

#[test]
fn rejected_payload_has_no_observable_effect() {
    init_logging();
    let mut state = attached();
    assert!(state.consume_dirty());
    let before = state.view();

    let (mut next, effects) = deliver(state, r#"{"type":"error","stage":"s"}"#);

    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
    let after = next.view();
    assert_eq!(after.event_count, before.event_count);
    assert_eq!(after.error_dialog, None);
}

#[test]
fn each_error_event_gets_its_own_dialog() {
    init_logging();
    let state = attached();
    let (state, first) = deliver(
        state,
        r#"{"type":"error","stage":"split","ts":"t","fileId":"f","message":"disk full"}"#,
    );
    let (state, second) = deliver(
        state,
        r#"{"type":"error","stage":"split","ts":"t","fileId":"f","message":"disk full"}"#,
    );
    let (state, third) = deliver(state, r#"{"type":"error","stage":"split","ts":"t","fileId":"f"}"#);

    assert_eq!(interrupts(&first), vec!["disk full".to_string()]);
    assert_eq!(interrupts(&second), vec!["disk full".to_string()]);
    assert_eq!(interrupts(&third), vec!["unknown error".to_string()]);

    let view = state.view();
    assert_eq!(view.interrupt_count, 3);
    assert_eq!(view.error_dialog.as_deref(), Some("disk full"));
    assert_eq!(view.queued_error_dialogs, 2);

    let (state, effects) = update(state, Msg::ErrorDialogDismissed);
    assert!(effects.is_empty());
    let (state, _) = update(state, Msg::ErrorDialogDismissed);
    assert_eq!(state.view().error_dialog.as_deref(), Some("unknown error"));
    let (state, _) = update(state, Msg::ErrorDialogDismissed);
    assert_eq!(state.view().error_dialog, None);
}

#[test]
fn non_error_kinds_never_interrupt() {
    init_logging();
    let mut state = attached();
    for kind in ["stage", "progress", "warning", "metric", "completed"] {
        let raw = format!(
            r#"{{"type":"{kind}","stage":"s","ts":"t","fileId":"f","message":"note"}}"#
        );
        let (next, effects) = deliver(state, &raw);
        assert!(effects.is_empty(), "{kind} produced {effects:?}");
        state = next;
    }
    assert_eq!(state.view().interrupt_count, 0);
    assert_eq!(state.event_count(), 5);
}

#[test]
fn rendering_does_not_refire_interrupts() {
    init_logging();
    let state = attached();
    let (state, effects) = deliver(
        state,
        r#"{"type":"error","stage":"s","ts":"t","fileId":"f","message":"boom"}"#,
    );
    assert_eq!(interrupts(&effects).len(), 1);

    let _ = state.view();
    let _ = state.snapshot();
    let (state, effects) = update(state, Msg::Tick);
    assert!(effects.is_empty());
    assert_eq!(state.view().interrupt_count, 1);
}

#[test]
fn confirming_error_dialog_exports_log() {
    init_logging();
    let state = attached();
    let (state, _) = deliver(
        state,
        r#"{"type":"error","stage":"s","ts":"t","fileId":"f","message":"boom"}"#,
    );

    let (state, effects) = update(state, Msg::ErrorDialogConfirmed);
    assert_eq!(state.view().error_dialog, None);
    match effects.as_slice() {
        [Effect::ExportLog { jsonl, event_count }] => {
            assert_eq!(*event_count, 1);
            assert!(jsonl.contains("\"message\":\"boom\""));
        }
        other => panic!("unexpected effects {other:?}"),
    }

    let (_state, effects) = update(state, Msg::ErrorDialogConfirmed);
    assert!(effects.is_empty());
}

#[test]
fn payloads_are_ignored_unless_attached() {
    init_logging();
    let raw = r#"{"type":"stage","stage":"s","ts":"t","fileId":"f"}"#;

    let (state, _) = deliver(MonitorState::new(), raw);
    assert_eq!(state.event_count(), 0);

    let (state, _) = update(state, Msg::ListenerAttached);
    let (state, _) = deliver(state, raw);
    assert_eq!(state.event_count(), 1);

    let (state, _) = update(state, Msg::ListenerDetached);
    let (state, _) = deliver(state, raw);
    assert_eq!(state.event_count(), 1);
    assert_eq!(*state.channel(), ChannelStatus::Detached);
}

#[test]
fn listener_failure_is_fatal_and_distinct_from_worker_errors() {
    init_logging();
    let (state, effects) = update(
        MonitorState::new(),
        Msg::ListenerFailed("bus closed".to_string()),
    );

    assert_eq!(
        *state.channel(),
        ChannelStatus::Failed("bus closed".to_string())
    );
    match effects.as_slice() {
        [Effect::Notify(notification)] => {
            assert_eq!(notification.level, NotificationLevel::Fatal);
            assert_eq!(notification.description.as_deref(), Some("bus closed"));
        }
        other => panic!("unexpected effects {other:?}"),
    }
    assert_eq!(state.view().interrupt_count, 0);
}

#[test]
fn new_session_resets_the_log() {
    init_logging();
    let state = attached();
    let (state, _) = deliver(
        state,
        r#"{"type":"progress","stage":"s","ts":"t","fileId":"f","percent":0.4}"#,
    );
    let (state, _) = deliver(state, "garbage");
    assert_eq!(state.view().global_percent, Some(40.0));

    let (state, effects) = update(state, Msg::NewSession);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.event_count, 0);
    assert_eq!(view.rejected_count, 0);
    assert_eq!(view.global_percent, None);
    assert!(view.job_ids.is_empty());
    assert_eq!(view.channel, ChannelStatus::Attached);
}

#[test]
fn view_from_builds_only_the_tail_with_absolute_indices() {
    init_logging();
    let mut state = attached();
    for (job, percent) in [("a", "0.1"), ("b", "0.2"), ("a", "0.3")] {
        let raw = format!(
            r#"{{"type":"progress","stage":"s","ts":"t","fileId":"{job}","percent":{percent}}}"#
        );
        state = deliver(state, &raw).0;
    }

    let tail = state.view_from(2);
    assert_eq!(tail.event_count, 3);
    assert_eq!(tail.events.len(), 1);
    assert_eq!(tail.events[0].index, 2);
    assert_eq!(tail.events[0].job_id, "a");
    assert_eq!(tail.job_ids, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(tail.global_percent, state.view().global_percent);

    let past_end = state.view_from(10);
    assert!(past_end.events.is_empty());
    assert_eq!(past_end.event_count, 3);
}

#[test]
fn timeline_rows_normalize_percent() {
    init_logging();
    let state = attached();
    let (state, _) = deliver(
        state,
        r#"{"type":"progress","stage":"s","ts":"t","fileId":"f","percent":0.25}"#,
    );
    let (state, _) = deliver(
        state,
        r#"{"type":"metric","stage":"s","ts":"t","fileId":"g","message":"pages=4"}"#,
    );

    let view = state.view();
    assert_eq!(view.events[0].percent, Some(25.0));
    assert_eq!(view.events[1].percent, None);
    assert_eq!(view.events[1].index, 1);
    assert_eq!(view.job_ids, vec!["f".to_string(), "g".to_string()]);
}

#[test]
fn error_with_overflowing_percent_still_interrupts() {
    init_logging();
    let (state, effects) = deliver(
        attached(),
        r#"{"type":"error","stage":"ocr","ts":"t","fileId":"f1","message":"OCR failed","percent":1e400}"#,
    );

    assert_eq!(interrupts(&effects), vec!["OCR failed".to_string()]);
    let view = state.view();
    assert_eq!(view.event_count, 1);
    assert_eq!(view.global_percent, None);
}
