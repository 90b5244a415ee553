use serde::{Deserialize, Serialize};

/// Opaque handle to a live DOM node, understood by the host-side
/// selector resolver and page actions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// The element kinds the synthesizer distinguishes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ElementTag {
    Input,
    TextArea,
    Select,
    Anchor,
    Button,
    Body,
    Html,
    #[default]
    Other,
}

impl ElementTag {
    /// Whether the element accepts free text input
    pub fn is_text_field(&self) -> bool {
        matches!(self, ElementTag::Input | ElementTag::TextArea)
    }
}

/// Point-in-time description of an event's target element
///
/// Captured by the host glue when the event fires; the recorder never
/// touches the live DOM directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementSnapshot {
    pub node: NodeId,
    pub tag: ElementTag,

    /// The `type` attribute for input elements
    pub input_type: Option<String>,

    /// Current value of the control
    pub value: String,

    /// Caret position inside a text control
    pub selection_start: Option<usize>,

    pub aria_label: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub inner_text: Option<String>,

    /// Anchor destination
    pub href: Option<String>,

    /// The `target` attribute of an anchor
    pub link_target: Option<String>,

    /// Whether the element belongs to a form
    pub in_form: bool,

    /// Marks the recorder's own instrumentation elements; never recorded
    pub recorder_ui: bool,
}

/// Held-down modifier keys at event time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClickEvent {
    pub target: ElementSnapshot,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub target: ElementSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyDownEvent {
    /// The key name as the page reports it, e.g. `Enter`, `p`, `ArrowDown`
    pub key: String,
    pub modifiers: Modifiers,
    /// Whether this is an auto-repeat of a held key
    pub repeat: bool,
    /// The focused element, if any page element has focus
    pub target: Option<ElementSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputEvent {
    pub target: ElementSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrollEvent {
    /// The scrolled element; `None` for document-level scroll
    pub target: Option<ElementSnapshot>,
    pub scroll_x: i64,
    pub scroll_y: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FocusEvent {
    pub target: ElementSnapshot,
}

/// A raw interaction event delivered by the host glue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PageEvent {
    Click(ClickEvent),
    Change(ChangeEvent),
    KeyDown(KeyDownEvent),
    Input(InputEvent),
    Scroll(ScrollEvent),
    FocusIn(FocusEvent),
    FocusOut(FocusEvent),
    /// The document is being unloaded
    BeforeUnload,
}

/// Tells the host glue whether to cancel the browser's default action
///
/// The decision is computed synchronously, before any store I/O, because
/// the page needs it in the same tick the event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventDisposition {
    pub prevent_default: bool,
}

impl EventDisposition {
    pub fn pass() -> Self {
        Self {
            prevent_default: false,
        }
    }

    pub fn prevent() -> Self {
        Self {
            prevent_default: true,
        }
    }
}

/// Key names that are modifiers on their own and never form a combination
const MODIFIER_KEY_NAMES: [&str; 6] = ["Control", "Alt", "Shift", "Meta", "AltGraph", "OS"];

/// Normalize a key press into a `Ctrl+Alt+Shift+Meta+<Key>` combination
///
/// Returns `None` for bare modifier presses.
pub fn key_combination(event: &KeyDownEvent) -> Option<String> {
    if MODIFIER_KEY_NAMES.contains(&event.key.as_str()) {
        return None;
    }

    let mut parts: Vec<String> = Vec::with_capacity(5);
    if event.modifiers.ctrl {
        parts.push("Ctrl".to_string());
    }
    if event.modifiers.alt {
        parts.push("Alt".to_string());
    }
    if event.modifiers.shift {
        parts.push("Shift".to_string());
    }
    if event.modifiers.meta {
        parts.push("Meta".to_string());
    }

    // Single characters are uppercased so the combination reads the same
    // with or without shift
    let key = if event.key.chars().count() == 1 {
        event.key.to_uppercase()
    } else {
        event.key.clone()
    };
    parts.push(key);

    Some(parts.join("+"))
}
