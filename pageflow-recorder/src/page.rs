use crate::blocks::RecordingSession;
use crate::error::Result;
use crate::events::{ElementSnapshot, NodeId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Turns a DOM node into a stable locator string
///
/// Deterministic for a stable DOM subtree; no side effects.
pub trait SelectorResolver: Send + Sync {
    fn resolve(&self, node: NodeId) -> String;
}

/// Async key/value store holding the current recording session
///
/// There is no compare-and-swap; callers read, decide, and write back in
/// one synchronous segment of a handler to keep the interleaving window
/// small.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether a recording session is currently active
    async fn recording_active(&self) -> Result<bool>;

    async fn get(&self) -> Result<RecordingSession>;

    async fn set(&self, session: RecordingSession) -> Result<()>;
}

/// Identifies the window a cross-frame message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSource(pub u64);

/// The document/window surface the recorder observes and drives
pub trait PageHost: Send + Sync {
    fn is_top_frame(&self) -> bool;

    fn current_url(&self) -> String;

    /// The currently focused page element, if any
    fn focused_element(&self) -> Option<ElementSnapshot>;

    /// Selector of this frame's own iframe/frame element, resolved
    /// relative to its parent document; `None` in the top frame or when
    /// the frame element is unreachable
    fn own_frame_selector(&self) -> Option<String>;

    /// Top-frame scan over its iframe/frame elements for the one whose
    /// content window matches the message source
    fn frame_selector_for_source(&self, source: &FrameSource) -> Option<String>;

    fn open_in_new_tab(&self, url: &str);

    /// Submit the form owning the given field
    fn submit_form(&self, field: NodeId);
}

/// Transient visual cue kinds for the capture-mode gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// A parameter capture is in progress on the field
    CaptureActive,
    /// The one-parameter-per-session limit was hit
    CaptureRejected,
}

/// Transient visual feedback on a field, decoupled from any rendering
/// mechanism
pub trait FeedbackSignal: Send + Sync {
    fn show(&self, node: NodeId, kind: FeedbackKind);
    fn clear(&self, node: NodeId);
}

/// The single cross-frame message type
pub const RECORD_EVENTS_MESSAGE: &str = "record-events";

/// Payload relayed from a nested frame to the top-level session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameMessage {
    /// Selector of the sending frame's element in its parent document,
    /// when the sender could resolve it
    pub frame_selector: Option<String>,

    /// The sender's view of the recording session
    pub recording: RecordingSession,

    #[serde(rename = "type")]
    pub kind: String,
}

impl FrameMessage {
    pub fn record_events(frame_selector: Option<String>, recording: RecordingSession) -> Self {
        Self {
            frame_selector,
            recording,
            kind: RECORD_EVENTS_MESSAGE.to_string(),
        }
    }

    pub fn is_record_events(&self) -> bool {
        self.kind == RECORD_EVENTS_MESSAGE
    }
}

/// A frame message together with its sender
#[derive(Debug, Clone)]
pub struct InboundFrameMessage {
    pub source: FrameSource,
    pub message: FrameMessage,
}

/// Cross-document message channel between frames
///
/// Subscribing hands back the receiving end; dropping it unsubscribes.
#[async_trait]
pub trait FrameChannel: Send + Sync {
    /// Deliver a message to the top frame
    async fn post_to_top(&self, message: FrameMessage) -> Result<()>;

    /// Top-frame side of the channel
    fn subscribe(&self) -> mpsc::UnboundedReceiver<InboundFrameMessage>;
}
