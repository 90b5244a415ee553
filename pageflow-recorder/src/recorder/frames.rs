use crate::blocks::RecordingSession;
use crate::page::{InboundFrameMessage, PageHost};
use tracing::debug;

/// Compose a frame path onto an element selector
pub fn compose_selector(frame_selector: &str, element_selector: &str) -> String {
    format!("{frame_selector} |> {element_selector}")
}

/// Top-frame side of the cross-frame relay
///
/// Rewrites the forwarded session's tail selector with the sending
/// frame's path, at most once per block: re-delivery of an
/// already-composed block is dropped rather than composed again.
#[derive(Debug, Default)]
pub struct FrameComposer {
    last_composed_uid: Option<String>,
}

impl FrameComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one inbound message; returns the session to persist, or
    /// `None` when the message is dropped
    pub fn compose(
        &mut self,
        inbound: InboundFrameMessage,
        host: &dyn PageHost,
    ) -> Option<RecordingSession> {
        let InboundFrameMessage { source, message } = inbound;

        if !message.is_record_events() {
            return None;
        }

        let frame_selector = message
            .frame_selector
            .clone()
            .or_else(|| host.frame_selector_for_source(&source));

        let Some(frame_selector) = frame_selector else {
            debug!("dropping cross-frame message with no resolvable frame selector");
            return None;
        };

        let mut recording = message.recording;
        let tail = recording.tail_mut()?;

        if self.last_composed_uid.as_deref() == Some(tail.uid.as_str()) {
            debug!(uid = %tail.uid, "tail block already composed, dropping retransmission");
            return None;
        }

        let uid = tail.uid.clone();
        if let Some(selector) = tail.selector_mut() {
            *selector = compose_selector(&frame_selector, selector);
            self.last_composed_uid = Some(uid);
        }

        Some(recording)
    }

    pub fn reset(&mut self) {
        self.last_composed_uid = None;
    }
}
