use pageflow_recorder::recorder::synthesizer::{
    self, apply_change, apply_parameter_value, apply_press_key, apply_scroll, apply_text_input,
    Synthesis,
};
use pageflow_recorder::{
    BlockData, ElementSnapshot, ElementTag, FormFieldKind, NodeId, RecordingSession,
    PARAMETER_MARKER,
};

fn empty_session() -> RecordingSession {
    RecordingSession::default()
}

#[test]
fn test_continuous_scroll_keeps_one_block_with_last_offsets() {
    let mut session = empty_session();

    assert_eq!(
        apply_scroll(&mut session, "html".to_string(), 0, 100),
        Synthesis::Appended
    );
    assert_eq!(
        apply_scroll(&mut session, "html".to_string(), 0, 250),
        Synthesis::MergedTail
    );
    assert_eq!(
        apply_scroll(&mut session, "html".to_string(), 10, 480),
        Synthesis::MergedTail
    );

    assert_eq!(session.len(), 1);
    match &session.flows[0].data {
        BlockData::ElementScroll(scroll) => {
            assert_eq!(scroll.scroll_x, 10);
            assert_eq!(scroll.scroll_y, 480);
            assert_eq!(scroll.selector, "html");
        }
        other => panic!("expected element-scroll block, got {other:?}"),
    }
}

#[test]
fn test_scroll_after_other_block_appends() {
    let mut session = empty_session();
    apply_scroll(&mut session, "html".to_string(), 0, 100);
    apply_press_key(&mut session, "Enter".to_string(), String::new());
    apply_scroll(&mut session, "html".to_string(), 0, 300);

    assert_eq!(session.len(), 3);
    assert_eq!(session.tail().map(|b| b.kind()), Some("element-scroll"));
}

#[test]
fn test_file_upload_removes_artifact_click() {
    let mut session = empty_session();
    session.push(synthesizer::event_click_block(
        "#upload".to_string(),
        "Upload".to_string(),
    ));

    let upload = synthesizer::file_upload_block(
        "#upload".to_string(),
        vec!["C:\\fakepath\\report.pdf".to_string()],
        String::new(),
    );
    assert_eq!(apply_change(&mut session, upload), Synthesis::Appended);

    assert_eq!(session.len(), 1);
    assert_eq!(session.flows[0].kind(), "file-upload");
}

#[test]
fn test_file_upload_keeps_click_on_other_element() {
    let mut session = empty_session();
    session.push(synthesizer::event_click_block(
        "#other".to_string(),
        String::new(),
    ));

    let upload =
        synthesizer::file_upload_block("#upload".to_string(), vec!["a.txt".to_string()], String::new());
    apply_change(&mut session, upload);

    assert_eq!(session.len(), 2);
    assert_eq!(session.flows[0].kind(), "event-click");
    assert_eq!(session.flows[1].kind(), "file-upload");
}

#[test]
fn test_duplicate_text_field_change_is_suppressed() {
    let mut session = empty_session();
    session.push(synthesizer::forms_text_field_block(
        "#email".to_string(),
        "user@example.com".to_string(),
        String::new(),
    ));

    let duplicate = synthesizer::forms_text_field_block(
        "#email".to_string(),
        "user@example.com".to_string(),
        String::new(),
    );
    assert_eq!(apply_change(&mut session, duplicate), Synthesis::Suppressed);
    assert_eq!(session.len(), 1);
}

#[test]
fn test_text_input_merges_into_tail() {
    let mut session = empty_session();

    assert_eq!(
        apply_text_input(&mut session, "#q", "ru", String::new()),
        Synthesis::Appended
    );
    assert_eq!(
        apply_text_input(&mut session, "#q", "rust", String::new()),
        Synthesis::MergedTail
    );

    assert_eq!(session.len(), 1);
    match &session.flows[0].data {
        BlockData::Forms(forms) => {
            assert_eq!(forms.field, FormFieldKind::TextField);
            assert_eq!(forms.value, "rust");
        }
        other => panic!("expected forms block, got {other:?}"),
    }
}

#[test]
fn test_text_input_never_overwrites_templated_value() {
    let mut session = empty_session();
    session.push(synthesizer::forms_text_field_block(
        "#q".to_string(),
        format!("search for {PARAMETER_MARKER}"),
        String::new(),
    ));

    assert_eq!(
        apply_text_input(&mut session, "#q", "search for rust", String::new()),
        Synthesis::Suppressed
    );

    match &session.flows[0].data {
        BlockData::Forms(forms) => {
            assert_eq!(forms.value, format!("search for {PARAMETER_MARKER}"))
        }
        other => panic!("expected forms block, got {other:?}"),
    }
}

#[test]
fn test_text_input_on_other_selector_appends() {
    let mut session = empty_session();
    apply_text_input(&mut session, "#q", "rust", String::new());
    apply_text_input(&mut session, "#city", "Berlin", String::new());

    assert_eq!(session.len(), 2);
}

#[test]
fn test_consecutive_press_keys_share_a_group() {
    let mut session = empty_session();
    apply_press_key(&mut session, "Tab".to_string(), String::new());
    apply_press_key(&mut session, "Enter".to_string(), String::new());
    apply_press_key(&mut session, "Escape".to_string(), String::new());

    assert_eq!(session.len(), 3);
    let group = session.flows[0].group_id.clone();
    assert!(group.is_some());
    assert_eq!(session.flows[1].group_id, group);
    assert_eq!(session.flows[2].group_id, group);
}

#[test]
fn test_press_key_after_other_block_starts_fresh() {
    let mut session = empty_session();
    apply_press_key(&mut session, "Tab".to_string(), String::new());
    apply_scroll(&mut session, "html".to_string(), 0, 10);
    apply_press_key(&mut session, "Enter".to_string(), String::new());

    assert_eq!(session.flows[2].group_id, None);
}

#[test]
fn test_parameter_value_overwrites_most_recent_forms_block() {
    let mut session = empty_session();
    apply_text_input(&mut session, "#q", "old", String::new());
    apply_press_key(&mut session, "Tab".to_string(), String::new());

    let outcome = apply_parameter_value(
        &mut session,
        "#q",
        format!("search {PARAMETER_MARKER}"),
        String::new(),
    );
    assert_eq!(outcome, Synthesis::MergedTail);
    assert_eq!(session.len(), 2);
    match &session.flows[0].data {
        BlockData::Forms(forms) => assert_eq!(forms.value, format!("search {PARAMETER_MARKER}")),
        other => panic!("expected forms block, got {other:?}"),
    }
}

#[test]
fn test_parameter_value_appends_when_no_forms_block_exists() {
    let mut session = empty_session();
    let outcome = apply_parameter_value(
        &mut session,
        "#q",
        PARAMETER_MARKER.to_string(),
        "Text field (q)".to_string(),
    );

    assert_eq!(outcome, Synthesis::Appended);
    assert_eq!(session.len(), 1);
    assert_eq!(session.flows[0].kind(), "forms");
}

#[test]
fn test_describe_element_priority_and_truncation() {
    let snapshot = ElementSnapshot {
        node: NodeId(1),
        tag: ElementTag::Button,
        inner_text: Some("A very long button label that keeps going".to_string()),
        aria_label: Some("aria".to_string()),
        title: Some("title".to_string()),
        ..ElementSnapshot::default()
    };
    assert_eq!(
        synthesizer::describe_element(&snapshot, 24),
        "A very long button label"
    );

    let snapshot = ElementSnapshot {
        aria_label: Some("Close dialog".to_string()),
        title: Some("title".to_string()),
        ..ElementSnapshot::default()
    };
    assert_eq!(synthesizer::describe_element(&snapshot, 24), "Close dialog");

    let snapshot = ElementSnapshot {
        title: Some("Tooltip".to_string()),
        ..ElementSnapshot::default()
    };
    assert_eq!(synthesizer::describe_element(&snapshot, 24), "Tooltip");

    let snapshot = ElementSnapshot::default();
    assert_eq!(synthesizer::describe_element(&snapshot, 24), "");
}

#[test]
fn test_click_target_classification() {
    let text = ElementSnapshot {
        tag: ElementTag::Input,
        input_type: Some("text".to_string()),
        ..ElementSnapshot::default()
    };
    assert!(synthesizer::click_targets_text_editor(&text));

    let checkbox = ElementSnapshot {
        tag: ElementTag::Input,
        input_type: Some("checkbox".to_string()),
        ..ElementSnapshot::default()
    };
    assert!(!synthesizer::click_targets_text_editor(&checkbox));

    let select = ElementSnapshot {
        tag: ElementTag::Select,
        ..ElementSnapshot::default()
    };
    assert!(synthesizer::click_targets_text_editor(&select));
}
