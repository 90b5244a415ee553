use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Helper function to filter empty descriptions for serde skip_serializing_if
fn is_empty_string(s: &Option<String>) -> bool {
    match s {
        Some(s) => s.trim().is_empty(),
        None => true,
    }
}

/// Represents one recorded automation step
///
/// A block is tagged by `kind` and carries the replay-relevant attributes
/// for that kind in `data`. Selectors inside `data` are either a bare
/// locator or a composed locator of the form
/// `<frameSelector> |> <elementSelector>` when the step was recorded
/// inside a nested frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Stable identity of the block; the frame coordinator keys selector
    /// composition on it so a retransmitted block is never composed twice
    pub uid: String,

    /// Short human-readable label for the step
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub description: Option<String>,

    /// Shared by consecutive press-key blocks so a replay engine can treat
    /// them as one contiguous typed sequence
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none", default)]
    pub group_id: Option<String>,

    /// The kind-specific payload
    #[serde(flatten)]
    pub data: BlockData,
}

impl Block {
    /// Create a block with a fresh uid and no description
    pub fn new(data: BlockData) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            description: None,
            group_id: None,
            data,
        }
    }

    /// Attach a description, dropping empty strings
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }

    /// The serialized kind tag of this block
    pub fn kind(&self) -> &'static str {
        match &self.data {
            BlockData::Trigger(_) => "trigger",
            BlockData::EventClick(_) => "event-click",
            BlockData::Link(_) => "link",
            BlockData::Forms(_) => "forms",
            BlockData::FileUpload(_) => "file-upload",
            BlockData::TriggerEvent(_) => "trigger-event",
            BlockData::PressKey(_) => "press-key",
            BlockData::ElementScroll(_) => "element-scroll",
            BlockData::ActiveTab(_) => "active-tab",
            BlockData::Navigate(_) => "navigate",
        }
    }

    /// The element selector carried by this block, if its kind has one
    pub fn selector(&self) -> Option<&str> {
        match &self.data {
            BlockData::Trigger(_) | BlockData::ActiveTab(_) | BlockData::Navigate(_) => None,
            BlockData::EventClick(d) => Some(&d.selector),
            BlockData::Link(d) => Some(&d.selector),
            BlockData::Forms(d) => Some(&d.selector),
            BlockData::FileUpload(d) => Some(&d.selector),
            BlockData::TriggerEvent(d) => Some(&d.selector),
            BlockData::PressKey(d) => Some(&d.selector),
            BlockData::ElementScroll(d) => Some(&d.selector),
        }
    }

    /// Mutable access to the selector, used by the frame coordinator to
    /// rewrite it with the frame path prefix
    pub fn selector_mut(&mut self) -> Option<&mut String> {
        match &mut self.data {
            BlockData::Trigger(_) | BlockData::ActiveTab(_) | BlockData::Navigate(_) => None,
            BlockData::EventClick(d) => Some(&mut d.selector),
            BlockData::Link(d) => Some(&mut d.selector),
            BlockData::Forms(d) => Some(&mut d.selector),
            BlockData::FileUpload(d) => Some(&mut d.selector),
            BlockData::TriggerEvent(d) => Some(&mut d.selector),
            BlockData::PressKey(d) => Some(&mut d.selector),
            BlockData::ElementScroll(d) => Some(&mut d.selector),
        }
    }
}

/// Kind-tagged payload of a block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum BlockData {
    /// Entry point of a recording; seeded when the session is created
    Trigger(TriggerData),

    /// A generic click on a page element
    EventClick(EventClickData),

    /// A link that was opened in a new tab by the recorder
    Link(LinkData),

    /// A committed form-field value (text field or select)
    Forms(FormsData),

    /// A file picked into a file input
    FileUpload(FileUploadData),

    /// A synthetic DOM event to re-dispatch at replay time
    TriggerEvent(TriggerEventData),

    /// A key combination pressed outside of continuous typing
    PressKey(PressKeyData),

    /// A scroll offset applied to an element or the document
    ElementScroll(ElementScrollData),

    /// Marker telling the replay engine to operate on the active tab
    ActiveTab(ActiveTabData),

    /// A user-driven location change
    Navigate(NavigateData),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TriggerData {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventClickData {
    pub selector: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub description: Option<String>,
    pub wait_for_selector: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkData {
    pub selector: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub description: Option<String>,
}

/// Which form control a `forms` block drives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FormFieldKind {
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "text-field")]
    TextField,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormsData {
    pub selector: String,
    #[serde(rename = "type")]
    pub field: FormFieldKind,
    pub value: String,
    /// Milliseconds to wait before driving the field at replay time
    pub delay: u32,
    pub clear_value: bool,
    pub wait_for_selector: bool,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadData {
    pub selector: String,
    pub file_paths: Vec<String>,
    pub wait_for_selector: bool,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEventData {
    pub selector: String,
    pub event_name: String,
    pub event_type: String,
    pub wait_for_selector: bool,
    pub event_params: EventParams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventParams {
    pub bubbles: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressKeyData {
    /// Normalized key combination, e.g. `Ctrl+Shift+A` or `Enter`
    pub keys: String,
    pub selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementScrollData {
    pub selector: String,
    pub scroll_x: i64,
    pub scroll_y: i64,
    pub smooth: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActiveTabData {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigateData {
    pub url: String,
    /// Milliseconds the replay engine waits for the navigation to settle
    pub timeout: u64,
}

/// The ordered sequence of blocks accumulated for one recording
///
/// Append-only, except for in-place merge updates to the tail element.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordingSession {
    pub flows: Vec<Block>,
}

impl RecordingSession {
    /// Create a session seeded with the leading trigger block
    pub fn new() -> Self {
        Self {
            flows: vec![Block::new(BlockData::Trigger(TriggerData::default()))
                .with_description("Trigger")],
        }
    }

    /// The most recently recorded block
    pub fn tail(&self) -> Option<&Block> {
        self.flows.last()
    }

    /// Mutable access to the most recently recorded block
    pub fn tail_mut(&mut self) -> Option<&mut Block> {
        self.flows.last_mut()
    }

    pub fn push(&mut self, block: Block) {
        self.flows.push(block);
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
