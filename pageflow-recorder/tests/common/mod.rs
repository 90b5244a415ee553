#![allow(dead_code)]

use async_trait::async_trait;
use pageflow_recorder::{
    Block, ElementSnapshot, ElementTag, FeedbackKind, FeedbackSignal, FrameChannel, FrameMessage,
    FrameSource, InboundFrameMessage, NodeId, PageHost, RecorderConfig, RecordingSession, Result,
    SelectorResolver, SessionRecorder, SessionStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// In-memory session store
pub struct MemoryStore {
    session: Mutex<RecordingSession>,
    active: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(RecordingSession::new()),
            active: AtomicBool::new(true),
        }
    }

    pub fn inactive() -> Self {
        let store = Self::new();
        store.active.store(false, Ordering::SeqCst);
        store
    }

    pub fn session(&self) -> RecordingSession {
        self.session.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn recording_active(&self) -> Result<bool> {
        Ok(self.active.load(Ordering::SeqCst))
    }

    async fn get(&self) -> Result<RecordingSession> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn set(&self, session: RecordingSession) -> Result<()> {
        *self.session.lock().unwrap() = session;
        Ok(())
    }
}

/// Resolver backed by a fixed node-to-selector map
pub struct MapResolver {
    selectors: HashMap<u64, String>,
}

impl MapResolver {
    pub fn new(pairs: &[(u64, &str)]) -> Self {
        Self {
            selectors: pairs
                .iter()
                .map(|(node, selector)| (*node, selector.to_string()))
                .collect(),
        }
    }
}

impl SelectorResolver for MapResolver {
    fn resolve(&self, node: NodeId) -> String {
        self.selectors
            .get(&node.0)
            .cloned()
            .unwrap_or_else(|| format!("#node-{}", node.0))
    }
}

/// Scriptable page host
pub struct MockHost {
    top_frame: bool,
    url: Mutex<String>,
    own_frame: Option<String>,
    child_frames: HashMap<u64, String>,
    pub opened_tabs: Mutex<Vec<String>>,
    pub submitted_forms: Mutex<Vec<NodeId>>,
    pub focused: Mutex<Option<ElementSnapshot>>,
}

impl MockHost {
    pub fn top() -> Self {
        Self {
            top_frame: true,
            url: Mutex::new("https://example.com/".to_string()),
            own_frame: None,
            child_frames: HashMap::new(),
            opened_tabs: Mutex::new(Vec::new()),
            submitted_forms: Mutex::new(Vec::new()),
            focused: Mutex::new(None),
        }
    }

    pub fn child(own_frame: Option<&str>) -> Self {
        Self {
            top_frame: false,
            own_frame: own_frame.map(str::to_string),
            ..Self::top()
        }
    }

    /// Register a child frame for the top-frame source scan
    pub fn with_child_frame(mut self, source: u64, selector: &str) -> Self {
        self.child_frames.insert(source, selector.to_string());
        self
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }
}

impl PageHost for MockHost {
    fn is_top_frame(&self) -> bool {
        self.top_frame
    }

    fn current_url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    fn focused_element(&self) -> Option<ElementSnapshot> {
        self.focused.lock().unwrap().clone()
    }

    fn own_frame_selector(&self) -> Option<String> {
        self.own_frame.clone()
    }

    fn frame_selector_for_source(&self, source: &FrameSource) -> Option<String> {
        self.child_frames.get(&source.0).cloned()
    }

    fn open_in_new_tab(&self, url: &str) {
        self.opened_tabs.lock().unwrap().push(url.to_string());
    }

    fn submit_form(&self, field: NodeId) {
        self.submitted_forms.lock().unwrap().push(field);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCall {
    Show(NodeId, FeedbackKind),
    Clear(NodeId),
}

/// Feedback signal that records every call
#[derive(Default)]
pub struct RecordingFeedback {
    pub calls: Mutex<Vec<FeedbackCall>>,
}

impl RecordingFeedback {
    pub fn calls(&self) -> Vec<FeedbackCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl FeedbackSignal for RecordingFeedback {
    fn show(&self, node: NodeId, kind: FeedbackKind) {
        self.calls.lock().unwrap().push(FeedbackCall::Show(node, kind));
    }

    fn clear(&self, node: NodeId) {
        self.calls.lock().unwrap().push(FeedbackCall::Clear(node));
    }
}

/// Frame channel delivering posted messages straight back to the
/// subscriber, stamped with a fixed source
///
/// Each subscribe replaces the delivery pair, so a reinstalled recorder
/// gets a fresh receiver.
pub struct LoopbackChannel {
    source: FrameSource,
    tx: Mutex<mpsc::UnboundedSender<InboundFrameMessage>>,
    pub posted: Mutex<Vec<FrameMessage>>,
}

impl LoopbackChannel {
    pub fn new(source: u64) -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self {
            source: FrameSource(source),
            tx: Mutex::new(tx),
            posted: Mutex::new(Vec::new()),
        }
    }

    /// Inject an inbound message as if a frame had posted it
    pub fn inject(&self, source: u64, message: FrameMessage) {
        let _ = self.tx.lock().unwrap().send(InboundFrameMessage {
            source: FrameSource(source),
            message,
        });
    }

    pub fn posted(&self) -> Vec<FrameMessage> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameChannel for LoopbackChannel {
    async fn post_to_top(&self, message: FrameMessage) -> Result<()> {
        self.posted.lock().unwrap().push(message.clone());
        let _ = self.tx.lock().unwrap().send(InboundFrameMessage {
            source: self.source,
            message,
        });
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<InboundFrameMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tx.lock().unwrap() = tx;
        rx
    }
}

/// A fully wired recorder with inspectable collaborators
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub host: Arc<MockHost>,
    pub feedback: Arc<RecordingFeedback>,
    pub channel: Arc<LoopbackChannel>,
    pub recorder: SessionRecorder,
}

impl Harness {
    pub fn top(resolver_pairs: &[(u64, &str)]) -> Self {
        Self::with_parts(
            RecorderConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MockHost::top()),
            Arc::new(LoopbackChannel::new(0)),
            resolver_pairs,
        )
    }

    pub fn with_parts(
        config: RecorderConfig,
        store: Arc<MemoryStore>,
        host: Arc<MockHost>,
        channel: Arc<LoopbackChannel>,
        resolver_pairs: &[(u64, &str)],
    ) -> Self {
        let feedback = Arc::new(RecordingFeedback::default());
        let recorder = SessionRecorder::new(
            config,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::new(MapResolver::new(resolver_pairs)),
            Arc::clone(&host) as Arc<dyn PageHost>,
            Arc::clone(&feedback) as Arc<dyn FeedbackSignal>,
            Arc::clone(&channel) as Arc<dyn FrameChannel>,
        );

        Self {
            store,
            host,
            feedback,
            channel,
            recorder,
        }
    }

    /// Recorded blocks, without the trigger and active-tab bookkeeping
    pub fn user_flows(&self) -> Vec<Block> {
        self.store
            .session()
            .flows
            .into_iter()
            .filter(|block| !matches!(block.kind(), "trigger" | "active-tab"))
            .collect()
    }

    pub fn flows(&self) -> Vec<Block> {
        self.store.session().flows
    }
}

// Element snapshot builders

pub fn text_input(node: u64, value: &str) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(node),
        tag: ElementTag::Input,
        input_type: Some("text".to_string()),
        value: value.to_string(),
        selection_start: Some(value.chars().count()),
        ..ElementSnapshot::default()
    }
}

pub fn form_text_input(node: u64, value: &str) -> ElementSnapshot {
    ElementSnapshot {
        in_form: true,
        ..text_input(node, value)
    }
}

pub fn button(node: u64, label: &str) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(node),
        tag: ElementTag::Button,
        inner_text: Some(label.to_string()),
        ..ElementSnapshot::default()
    }
}

pub fn anchor(node: u64, href: &str, text: &str, target: Option<&str>) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(node),
        tag: ElementTag::Anchor,
        inner_text: Some(text.to_string()).filter(|t| !t.is_empty()),
        href: Some(href.to_string()),
        link_target: target.map(str::to_string),
        ..ElementSnapshot::default()
    }
}

pub fn select_element(node: u64, value: &str, name: &str) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(node),
        tag: ElementTag::Select,
        value: value.to_string(),
        name: Some(name.to_string()).filter(|n| !n.is_empty()),
        ..ElementSnapshot::default()
    }
}

pub fn file_input(node: u64, path: &str) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(node),
        tag: ElementTag::Input,
        input_type: Some("file".to_string()),
        value: path.to_string(),
        ..ElementSnapshot::default()
    }
}

pub fn checkbox(node: u64) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(node),
        tag: ElementTag::Input,
        input_type: Some("checkbox".to_string()),
        ..ElementSnapshot::default()
    }
}

pub fn body() -> ElementSnapshot {
    ElementSnapshot {
        tag: ElementTag::Body,
        ..ElementSnapshot::default()
    }
}
