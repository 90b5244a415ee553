//! Web interaction recording core
//!
//! This crate observes a user's live interaction with a web page and
//! incrementally synthesizes a structured, replayable automation script
//! from raw interaction events: clicks, key presses, form edits,
//! selections, scrolling, and navigation, including interactions inside
//! nested frames of the same page.
//!
//! The page itself stays behind trait seams ([`page::SelectorResolver`],
//! [`page::SessionStore`], [`page::PageHost`], [`page::FeedbackSignal`],
//! [`page::FrameChannel`]); host glue feeds raw [`events::PageEvent`]s
//! into a [`recorder::SessionRecorder`], which classifies them,
//! deduplicates noisy signals through trailing-edge debouncers, and
//! mutates the recording session accordingly.

pub mod blocks;
pub mod debounce;
pub mod error;
pub mod events;
pub mod page;
pub mod recorder;

pub use blocks::{
    ActiveTabData, Block, BlockData, ElementScrollData, EventClickData, EventParams,
    FileUploadData, FormFieldKind, FormsData, LinkData, NavigateData, PressKeyData,
    RecordingSession, TriggerData, TriggerEventData,
};
pub use debounce::Debouncer;
pub use error::{RecorderError, Result};
pub use events::{
    key_combination, ChangeEvent, ClickEvent, ElementSnapshot, ElementTag, EventDisposition,
    FocusEvent, InputEvent, KeyDownEvent, Modifiers, NodeId, PageEvent, ScrollEvent,
};
pub use page::{
    FeedbackKind, FeedbackSignal, FrameChannel, FrameMessage, FrameSource, InboundFrameMessage,
    PageHost, SelectorResolver, SessionStore, RECORD_EVENTS_MESSAGE,
};
pub use recorder::capture::{CaptureState, ChordOutcome, PARAMETER_MARKER};
pub use recorder::frames::{compose_selector, FrameComposer};
pub use recorder::navigation::NavigationState;
pub use recorder::synthesizer::Synthesis;
pub use recorder::{RecorderConfig, SessionRecorder};
