use crate::blocks::{
    ActiveTabData, Block, BlockData, ElementScrollData, EventClickData, EventParams, FileUploadData,
    FormFieldKind, FormsData, LinkData, NavigateData, PressKeyData, TriggerEventData,
};
use crate::events::{ElementSnapshot, ElementTag};
use crate::recorder::capture::value_is_templated;
use uuid::Uuid;

/// What the synthesizer decided to do with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesis {
    /// A new block was appended to the session
    Appended,
    /// An existing block was updated in place
    MergedTail,
    /// The event produced no session change
    Suppressed,
}

impl Synthesis {
    pub fn changed(&self) -> bool {
        !matches!(self, Synthesis::Suppressed)
    }
}

/// Whether a click lands on a text-editing control
///
/// Those are handled on value commit, not on click.
pub fn click_targets_text_editor(target: &ElementSnapshot) -> bool {
    match target.tag {
        ElementTag::Select | ElementTag::TextArea => true,
        ElementTag::Input => target.input_type.as_deref() == Some("text"),
        _ => false,
    }
}

fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

/// First `limit` characters of visible text, aria-label, or title, in
/// that priority order; empty when none exist
pub fn describe_element(target: &ElementSnapshot, limit: usize) -> String {
    let source = [&target.inner_text, &target.aria_label, &target.title]
        .into_iter()
        .find_map(|s| s.as_deref().filter(|s| !s.is_empty()));

    source.map(|s| truncate_chars(s, limit)).unwrap_or_default()
}

/// Link description: visible text, falling back to the destination
pub fn describe_link(target: &ElementSnapshot, limit: usize) -> String {
    let source = [&target.inner_text, &target.href]
        .into_iter()
        .find_map(|s| s.as_deref().filter(|s| !s.is_empty()));

    source.map(|s| truncate_chars(s, limit)).unwrap_or_default()
}

/// Short field label from aria-label or name
pub fn field_label(target: &ElementSnapshot, limit: usize) -> String {
    truncate_chars(&element_name(target), limit)
}

/// The element's accessible name: aria-label, falling back to its name
pub fn element_name(target: &ElementSnapshot) -> String {
    [&target.aria_label, &target.name]
        .into_iter()
        .find_map(|s| s.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

pub fn event_click_block(selector: String, description: String) -> Block {
    Block::new(BlockData::EventClick(EventClickData {
        selector,
        description: Some(description.clone()).filter(|d| !d.is_empty()),
        wait_for_selector: true,
    }))
    .with_description(description)
}

pub fn link_block(selector: String, description: String) -> Block {
    Block::new(BlockData::Link(LinkData {
        selector,
        description: Some(description.clone()).filter(|d| !d.is_empty()),
    }))
    .with_description(description)
}

pub fn forms_text_field_block(selector: String, value: String, description: String) -> Block {
    Block::new(BlockData::Forms(FormsData {
        selector,
        field: FormFieldKind::TextField,
        value,
        delay: 100,
        clear_value: true,
        wait_for_selector: true,
        description: Some(description).filter(|d| !d.is_empty()),
    }))
}

pub fn forms_select_block(selector: String, value: String, description: String) -> Block {
    Block::new(BlockData::Forms(FormsData {
        selector,
        field: FormFieldKind::Select,
        value,
        delay: 100,
        clear_value: true,
        wait_for_selector: true,
        description: Some(description).filter(|d| !d.is_empty()),
    }))
}

pub fn file_upload_block(selector: String, file_paths: Vec<String>, description: String) -> Block {
    Block::new(BlockData::FileUpload(FileUploadData {
        selector,
        file_paths,
        wait_for_selector: true,
        description: Some(description.clone()).filter(|d| !d.is_empty()),
    }))
    .with_description(description)
}

/// A generic change notification for input types without a dedicated kind
pub fn change_trigger_block(selector: String) -> Block {
    Block::new(BlockData::TriggerEvent(TriggerEventData {
        selector,
        event_name: "change".to_string(),
        event_type: "event".to_string(),
        wait_for_selector: true,
        event_params: EventParams { bubbles: true },
    }))
}

pub fn active_tab_block() -> Block {
    Block::new(BlockData::ActiveTab(ActiveTabData::default())).with_description("Active tab")
}

pub fn navigate_block(url: String, timeout: u64) -> Block {
    let description = format!("Navigate to {url}");
    Block::new(BlockData::Navigate(NavigateData { url, timeout })).with_description(description)
}

/// Append unconditionally
pub fn apply_append(session: &mut crate::blocks::RecordingSession, block: Block) -> Synthesis {
    session.push(block);
    Synthesis::Appended
}

/// Append a value-commit block, cleaning up click artifacts and duplicates
///
/// A file-upload change immediately after a click on the same control
/// removes that click (it was only the file-picker opening). A would-be
/// duplicate text-field forms block for the tail's selector is suppressed.
pub fn apply_change(session: &mut crate::blocks::RecordingSession, block: Block) -> Synthesis {
    if let BlockData::FileUpload(upload) = &block.data {
        let artifact_click = session.tail().is_some_and(|tail| {
            matches!(&tail.data, BlockData::EventClick(click) if click.selector == upload.selector)
        });
        if artifact_click {
            session.flows.pop();
        }
    }

    if let BlockData::Forms(forms) = &block.data {
        if forms.field == FormFieldKind::TextField
            && session.tail().and_then(|tail| tail.selector()) == Some(forms.selector.as_str())
        {
            return Synthesis::Suppressed;
        }
    }

    session.push(block);
    Synthesis::Appended
}

/// Record a scroll position; continuous scrolling overwrites the tail
pub fn apply_scroll(
    session: &mut crate::blocks::RecordingSession,
    selector: String,
    scroll_x: i64,
    scroll_y: i64,
) -> Synthesis {
    if let Some(tail) = session.tail_mut() {
        if let BlockData::ElementScroll(scroll) = &mut tail.data {
            scroll.scroll_x = scroll_x;
            scroll.scroll_y = scroll_y;
            return Synthesis::MergedTail;
        }
    }

    session.push(Block::new(BlockData::ElementScroll(ElementScrollData {
        selector,
        scroll_x,
        scroll_y,
        smooth: true,
    })));
    Synthesis::Appended
}

/// Record a live text-field value
///
/// Continuous typing into the same field overwrites the tail block's
/// value, unless that value is already templated with a parameter marker,
/// in which case the live value must not be echoed back.
pub fn apply_text_input(
    session: &mut crate::blocks::RecordingSession,
    selector: &str,
    value: &str,
    description: String,
) -> Synthesis {
    if let Some(tail) = session.tail_mut() {
        if let BlockData::Forms(forms) = &mut tail.data {
            if forms.field == FormFieldKind::TextField && forms.selector == selector {
                if value_is_templated(&forms.value) {
                    return Synthesis::Suppressed;
                }
                forms.value = value.to_string();
                return Synthesis::MergedTail;
            }
        }
    }

    session.push(forms_text_field_block(
        selector.to_string(),
        value.to_string(),
        description,
    ));
    Synthesis::Appended
}

/// Record a key combination; consecutive press-key blocks share a group id
pub fn apply_press_key(
    session: &mut crate::blocks::RecordingSession,
    keys: String,
    selector: String,
) -> Synthesis {
    let group_id = match session.tail_mut() {
        Some(tail) if matches!(tail.data, BlockData::PressKey(_)) => Some(
            tail.group_id
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone(),
        ),
        _ => None,
    };

    let description = format!("Press: {keys}");
    let mut block =
        Block::new(BlockData::PressKey(PressKeyData { keys, selector })).with_description(description);
    block.group_id = group_id;

    session.push(block);
    Synthesis::Appended
}

/// Write a templated parameter value into the recording
///
/// Searches the session from the end backward for the most recent forms
/// block on the captured field; appends a fresh text-field block when no
/// such block exists yet.
pub fn apply_parameter_value(
    session: &mut crate::blocks::RecordingSession,
    field_selector: &str,
    value: String,
    description: String,
) -> Synthesis {
    for block in session.flows.iter_mut().rev() {
        if let BlockData::Forms(forms) = &mut block.data {
            if forms.selector == field_selector {
                forms.value = value;
                return Synthesis::MergedTail;
            }
        }
    }

    session.push(forms_text_field_block(
        field_selector.to_string(),
        value,
        description,
    ));
    Synthesis::Appended
}
