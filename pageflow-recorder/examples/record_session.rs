//! Drives the recorder with a scripted interaction sequence and prints
//! the synthesized recording session as JSON.
//!
//! Run with: cargo run --example record_session

use async_trait::async_trait;
use pageflow_recorder::{
    ChangeEvent, ClickEvent, ElementSnapshot, ElementTag, FeedbackKind, FeedbackSignal,
    FocusEvent, FrameChannel, FrameMessage, InboundFrameMessage, InputEvent, KeyDownEvent,
    Modifiers, NodeId, PageEvent, PageHost, RecorderConfig, RecordingSession, Result,
    SelectorResolver, SessionRecorder, SessionStore,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

struct DemoStore {
    session: Mutex<RecordingSession>,
}

#[async_trait]
impl SessionStore for DemoStore {
    async fn recording_active(&self) -> Result<bool> {
        Ok(true)
    }

    async fn get(&self) -> Result<RecordingSession> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn set(&self, session: RecordingSession) -> Result<()> {
        *self.session.lock().unwrap() = session;
        Ok(())
    }
}

struct DemoResolver;

impl SelectorResolver for DemoResolver {
    fn resolve(&self, node: NodeId) -> String {
        match node.0 {
            1 => "#search-input".to_string(),
            2 => "button.search-submit".to_string(),
            3 => "a.first-result".to_string(),
            n => format!("#node-{n}"),
        }
    }
}

struct DemoHost;

impl PageHost for DemoHost {
    fn is_top_frame(&self) -> bool {
        true
    }

    fn current_url(&self) -> String {
        "https://example.com/".to_string()
    }

    fn focused_element(&self) -> Option<ElementSnapshot> {
        None
    }

    fn own_frame_selector(&self) -> Option<String> {
        None
    }

    fn frame_selector_for_source(
        &self,
        _source: &pageflow_recorder::FrameSource,
    ) -> Option<String> {
        None
    }

    fn open_in_new_tab(&self, url: &str) {
        info!(%url, "would open in a new tab");
    }

    fn submit_form(&self, field: NodeId) {
        info!(?field, "would submit the form");
    }
}

struct LogFeedback;

impl FeedbackSignal for LogFeedback {
    fn show(&self, node: NodeId, kind: FeedbackKind) {
        info!(?node, ?kind, "feedback shown");
    }

    fn clear(&self, node: NodeId) {
        info!(?node, "feedback cleared");
    }
}

struct DemoChannel {
    rx: Mutex<Option<mpsc::UnboundedReceiver<InboundFrameMessage>>>,
}

impl DemoChannel {
    fn new() -> Self {
        let (_tx, rx) = mpsc::unbounded_channel();
        Self {
            rx: Mutex::new(Some(rx)),
        }
    }
}

#[async_trait]
impl FrameChannel for DemoChannel {
    async fn post_to_top(&self, _message: FrameMessage) -> Result<()> {
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<InboundFrameMessage> {
        self.rx.lock().unwrap().take().expect("subscribed twice")
    }
}

fn search_field(value: &str) -> ElementSnapshot {
    ElementSnapshot {
        node: NodeId(1),
        tag: ElementTag::Input,
        input_type: Some("text".to_string()),
        value: value.to_string(),
        selection_start: Some(value.chars().count()),
        name: Some("q".to_string()),
        in_form: true,
        ..ElementSnapshot::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(DemoStore {
        session: Mutex::new(RecordingSession::new()),
    });

    let mut recorder = SessionRecorder::new(
        RecorderConfig::default(),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        Arc::new(DemoResolver),
        Arc::new(DemoHost),
        Arc::new(LogFeedback),
        Arc::new(DemoChannel::new()),
    );

    recorder.install().await?;
    info!("recorder installed, replaying a scripted interaction");

    // Focus the search field and type a query
    recorder
        .dispatch(PageEvent::FocusIn(FocusEvent {
            target: search_field(""),
        }))
        .await;
    for prefix in ["rus", "rust asy", "rust async"] {
        recorder
            .dispatch(PageEvent::Input(InputEvent {
                target: search_field(prefix),
            }))
            .await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Submit the query with Enter
    recorder
        .dispatch(PageEvent::KeyDown(KeyDownEvent {
            key: "Enter".to_string(),
            modifiers: Modifiers::default(),
            repeat: false,
            target: Some(search_field("rust async")),
        }))
        .await;

    // Click through to the first result
    recorder
        .dispatch(PageEvent::Click(ClickEvent {
            target: ElementSnapshot {
                node: NodeId(3),
                tag: ElementTag::Anchor,
                inner_text: Some("Asynchronous Programming in Rust".to_string()),
                href: Some("https://example.com/book".to_string()),
                link_target: Some("_blank".to_string()),
                ..ElementSnapshot::default()
            },
            modifiers: Modifiers::default(),
        }))
        .await;

    // Change a filter dropdown
    recorder
        .dispatch(PageEvent::Change(ChangeEvent {
            target: ElementSnapshot {
                node: NodeId(4),
                tag: ElementTag::Select,
                value: "past-year".to_string(),
                name: Some("time-range".to_string()),
                ..ElementSnapshot::default()
            },
        }))
        .await;

    tokio::time::sleep(Duration::from_millis(700)).await;
    recorder.teardown();

    let session = store.get().await?;
    println!("{}", serde_json::to_string_pretty(&session)?);

    Ok(())
}
