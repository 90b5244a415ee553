use crate::blocks::{Block, RecordingSession};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::events::{
    key_combination, ChangeEvent, ClickEvent, ElementSnapshot, ElementTag, EventDisposition,
    FocusEvent, InputEvent, KeyDownEvent, NodeId, PageEvent, ScrollEvent,
};
use crate::page::{
    FeedbackKind, FeedbackSignal, FrameChannel, FrameMessage, InboundFrameMessage, PageHost,
    SelectorResolver, SessionStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn};

pub mod capture;
pub mod frames;
pub mod navigation;
pub mod synthesizer;

use capture::{CaptureState, ChordOutcome};
use frames::FrameComposer;
use navigation::NavigationState;
use synthesizer::Synthesis;

/// Configuration for the session recorder
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Whether to record scroll positions
    pub record_scroll: bool,

    /// Whether to record key combinations as press-key blocks
    pub record_keys: bool,

    /// Whether to watch for user-driven navigation
    pub record_navigation: bool,

    /// Key completing the parameter-capture chord together with Ctrl+Alt
    pub capture_chord_key: String,

    /// Trailing-edge window coalescing scroll events (milliseconds)
    pub scroll_debounce_ms: u64,

    /// Trailing-edge window coalescing continuous typing (milliseconds)
    pub text_input_debounce_ms: u64,

    /// Trailing-edge window on the cross-frame message handler (milliseconds)
    pub frame_message_debounce_ms: u64,

    /// Poll interval of the navigation watcher (milliseconds)
    pub navigation_poll_interval_ms: u64,

    /// Width of the suppression window opened by form submissions and
    /// same-tab link clicks (milliseconds)
    pub navigation_suppress_ms: u64,

    /// Delay before the one-shot active-tab marker is inserted (milliseconds)
    pub active_tab_delay_ms: u64,

    /// Delay before a form captured on Enter is actually submitted (milliseconds)
    pub form_submit_delay_ms: u64,

    /// How long the capture-rejected cue stays visible (milliseconds)
    pub feedback_reject_clear_ms: u64,

    /// Maximum characters kept of an element description
    pub description_max_chars: usize,

    /// Maximum characters kept of a field label
    pub field_label_max_chars: usize,

    /// Timeout carried by synthesized navigate blocks (milliseconds)
    pub navigate_timeout_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            record_scroll: true,
            record_keys: true,
            record_navigation: true,
            capture_chord_key: "p".to_string(),
            scroll_debounce_ms: 500,
            text_input_debounce_ms: 300,
            frame_message_debounce_ms: 100,
            navigation_poll_interval_ms: 500,
            navigation_suppress_ms: 2000,
            active_tab_delay_ms: 100,
            form_submit_delay_ms: 500,
            feedback_reject_clear_ms: 1000,
            description_max_chars: 24,
            field_label_max_chars: 12,
            navigate_timeout_ms: 10_000,
        }
    }
}

impl RecorderConfig {
    fn suppress_window(&self) -> Duration {
        Duration::from_millis(self.navigation_suppress_ms)
    }
}

/// The text field currently tracked for live value updates
#[derive(Debug, Clone)]
struct TrackedField {
    node: NodeId,
    selector: String,
}

/// All ephemeral recorder state; constructed on install, reset on teardown
#[derive(Debug, Default)]
struct RecorderState {
    capture: CaptureState,
    navigation: NavigationState,
    tracked_field: Option<TrackedField>,
}

/// Collaborators and state shared between handlers and background tasks
struct RecorderShared {
    config: RecorderConfig,
    store: Arc<dyn SessionStore>,
    resolver: Arc<dyn SelectorResolver>,
    host: Arc<dyn PageHost>,
    feedback: Arc<dyn FeedbackSignal>,
    channel: Arc<dyn FrameChannel>,
    state: Mutex<RecorderState>,
    block_tx: broadcast::Sender<Block>,
    stop: Arc<AtomicBool>,
    deferred: Mutex<Vec<JoinHandle<()>>>,
}

impl RecorderShared {
    fn push_deferred(&self, handle: JoinHandle<()>) {
        let mut deferred = self.deferred.lock().unwrap();
        deferred.retain(|handle| !handle.is_finished());
        deferred.push(handle);
    }

    /// Read the session, apply one synchronous synthesis decision, and
    /// route the result
    ///
    /// The top frame persists the session and publishes the tail block;
    /// nested frames never write the store and instead forward their view
    /// to the top frame for selector composition. Store failures are
    /// logged and swallowed so recording continues.
    async fn commit<F>(&self, mutate: F)
    where
        F: FnOnce(&mut RecordingSession) -> Synthesis,
    {
        // No block additions are valid outside an active recorder lifetime
        if self.stop.load(Ordering::SeqCst) {
            return;
        }

        let mut session = match self.store.get().await {
            Ok(session) => session,
            Err(e) => {
                error!("failed to load recording session: {e}");
                return;
            }
        };

        let synthesis = mutate(&mut session);

        if self.host.is_top_frame() {
            if !synthesis.changed() {
                return;
            }

            let tail = session.tail().cloned();
            if let Err(e) = self.store.set(session).await {
                error!("failed to persist recording session: {e}");
                return;
            }
            if let Some(block) = tail {
                let _ = self.block_tx.send(block);
            }
        } else {
            let message = FrameMessage::record_events(self.host.own_frame_selector(), session);
            if let Err(e) = self.channel.post_to_top(message).await {
                error!("failed to forward block to top frame: {e}");
            }
        }
    }

    async fn on_click(&self, event: ClickEvent) -> EventDisposition {
        let target = &event.target;
        if target.recorder_ui || synthesizer::click_targets_text_editor(target) {
            return EventDisposition::pass();
        }

        let selector = self.resolver.resolve(target.node);

        if target.tag == ElementTag::Anchor {
            // Modified clicks are handled natively by the browser
            if event.modifiers.ctrl || event.modifiers.meta {
                return EventDisposition::pass();
            }

            if target.link_target.as_deref() == Some("_blank") {
                let description =
                    synthesizer::describe_link(target, self.config.description_max_chars);
                let block = synthesizer::link_block(selector, description);
                self.commit(|session| synthesizer::apply_append(session, block))
                    .await;

                // The cancelled default navigation is replaced by an
                // explicit reopen in a new tab
                if let Some(href) = target.href.as_deref() {
                    self.host.open_in_new_tab(href);
                }
                return EventDisposition::prevent();
            }

            // The same-tab link's own navigation must not also produce a
            // navigate block
            self.state
                .lock()
                .unwrap()
                .navigation
                .open_suppression_window(self.config.suppress_window());
        }

        let description = synthesizer::describe_element(target, self.config.description_max_chars);
        let block = synthesizer::event_click_block(selector, description);
        self.commit(|session| synthesizer::apply_append(session, block))
            .await;

        EventDisposition::pass()
    }

    async fn on_change(&self, event: ChangeEvent) {
        let target = &event.target;
        if target.recorder_ui {
            return;
        }

        let input_type = target.input_type.as_deref();
        if target.tag == ElementTag::Input && matches!(input_type, Some("checkbox" | "radio")) {
            // Native toggles; their state is implicit in replaying the click
            return;
        }

        let selector = self.resolver.resolve(target.node);
        let element_name = synthesizer::element_name(target);

        let block = if target.tag == ElementTag::Input && input_type == Some("file") {
            synthesizer::file_upload_block(selector, vec![target.value.clone()], element_name)
        } else if target.tag == ElementTag::Select {
            synthesizer::forms_select_block(
                selector,
                target.value.clone(),
                format!("Element Name ({element_name})"),
            )
        } else {
            synthesizer::change_trigger_block(selector)
        };

        self.commit(move |session| synthesizer::apply_change(session, block))
            .await;
    }

    fn is_capture_chord(&self, event: &KeyDownEvent) -> bool {
        event.key.eq_ignore_ascii_case(&self.config.capture_chord_key)
            && event.modifiers.ctrl
            && event.modifiers.alt
            && !event.modifiers.meta
            && !event.modifiers.shift
    }

    async fn on_capture_chord(&self, target: &ElementSnapshot) {
        let selector = self.resolver.resolve(target.node);
        let outcome = self
            .state
            .lock()
            .unwrap()
            .capture
            .handle_chord(target, selector);

        match outcome {
            ChordOutcome::Started => {
                debug!("parameter capture started");
                self.feedback.show(target.node, FeedbackKind::CaptureActive);
            }
            ChordOutcome::Rejected => {
                info!("parameter already captured in this session, only one allowed");
                self.feedback
                    .show(target.node, FeedbackKind::CaptureRejected);

                let feedback = Arc::clone(&self.feedback);
                let stop = Arc::clone(&self.stop);
                let node = target.node;
                let delay = Duration::from_millis(self.config.feedback_reject_clear_ms);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if !stop.load(Ordering::SeqCst) {
                        feedback.clear(node);
                    }
                });
                self.push_deferred(handle);
            }
            ChordOutcome::Finished {
                field_selector,
                templated_value,
            } => {
                self.feedback.clear(target.node);
                let description = format!(
                    "Text field ({})",
                    synthesizer::field_label(target, self.config.field_label_max_chars)
                );
                self.commit(move |session| {
                    synthesizer::apply_parameter_value(
                        session,
                        &field_selector,
                        templated_value,
                        description,
                    )
                })
                .await;
            }
        }
    }

    async fn on_key_down(&self, event: KeyDownEvent) -> EventDisposition {
        if event.repeat {
            return EventDisposition::pass();
        }
        if event.target.as_ref().is_some_and(|t| t.recorder_ui) {
            return EventDisposition::pass();
        }

        // Parameter chord inside a text field; the chord must never reach
        // the field as a character
        if let Some(target) = event.target.as_ref().filter(|t| t.tag.is_text_field()) {
            if self.is_capture_chord(&event) {
                self.on_capture_chord(target).await;
                return EventDisposition::prevent();
            }
        }

        let enter = event.key == "Enter";

        // Address-bar heuristic: Enter while no page element has focus
        let unfocused = event
            .target
            .as_ref()
            .map_or(true, |t| matches!(t.tag, ElementTag::Body | ElementTag::Html));
        if enter && unfocused {
            debug!("Enter with no focused element, assuming address-bar navigation");
            self.state.lock().unwrap().navigation.mark_user_navigation();
        }

        if let Some(target) = event.target.as_ref().filter(|t| t.tag.is_text_field()) {
            if !enter {
                // Continuous typing is recorded by the input debouncer
                return EventDisposition::pass();
            }

            // The navigation this Enter may cause is already explained by
            // the blocks recorded here
            self.state
                .lock()
                .unwrap()
                .navigation
                .open_suppression_window(self.config.suppress_window());

            let selector = self.resolver.resolve(target.node);

            if target.in_form && target.tag == ElementTag::Input {
                // Commit the live value before the synthetic submit
                let value = target.value.clone();
                let field_selector = selector.clone();
                self.commit(move |session| {
                    synthesizer::apply_text_input(session, &field_selector, &value, String::new())
                })
                .await;

                if self.config.record_keys {
                    if let Some(keys) = key_combination(&event) {
                        let key_selector = selector.clone();
                        self.commit(move |session| {
                            synthesizer::apply_press_key(session, keys, key_selector)
                        })
                        .await;
                    }
                }

                self.schedule_form_submit(target.node);
                return EventDisposition::prevent();
            }

            if self.config.record_keys {
                if let Some(keys) = key_combination(&event) {
                    self.commit(move |session| {
                        synthesizer::apply_press_key(session, keys, selector)
                    })
                    .await;
                }
            }
            return EventDisposition::pass();
        }

        if self.config.record_keys {
            if let Some(keys) = key_combination(&event) {
                self.commit(move |session| {
                    synthesizer::apply_press_key(session, keys, String::new())
                })
                .await;
            }
        }

        EventDisposition::pass()
    }

    /// Runs on the scroll debouncer's trailing edge
    async fn on_scroll_settled(&self, event: ScrollEvent) {
        if event.target.as_ref().is_some_and(|t| t.recorder_ui) {
            return;
        }

        let selector = match &event.target {
            None => "html".to_string(),
            Some(target) => self.resolver.resolve(target.node),
        };

        self.commit(move |session| {
            synthesizer::apply_scroll(session, selector, event.scroll_x, event.scroll_y)
        })
        .await;
    }

    /// Runs on the text-input debouncer's trailing edge
    async fn on_input_settled(&self, selector: String, event: InputEvent) {
        if self.state.lock().unwrap().capture.is_capturing() {
            debug!("skipping live value update while a parameter capture is active");
            return;
        }

        let description = format!(
            "Text field ({})",
            synthesizer::field_label(&event.target, self.config.field_label_max_chars)
        );
        let value = event.target.value.clone();
        self.commit(move |session| {
            synthesizer::apply_text_input(session, &selector, &value, description)
        })
        .await;
    }

    fn on_focus_in(&self, event: FocusEvent) {
        if !event.target.tag.is_text_field() {
            return;
        }

        let selector = self.resolver.resolve(event.target.node);
        self.state.lock().unwrap().tracked_field = Some(TrackedField {
            node: event.target.node,
            selector,
        });
    }

    fn on_focus_out(&self, event: FocusEvent) {
        if !event.target.tag.is_text_field() {
            return;
        }

        let mut state = self.state.lock().unwrap();
        if state
            .tracked_field
            .as_ref()
            .is_some_and(|tracked| tracked.node == event.target.node)
        {
            state.tracked_field = None;
        }
    }

    /// Submit the form once the captured blocks are in place
    fn schedule_form_submit(&self, field: NodeId) {
        let host = Arc::clone(&self.host);
        let stop = Arc::clone(&self.stop);
        let delay = Duration::from_millis(self.config.form_submit_delay_ms);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !stop.load(Ordering::SeqCst) {
                host.submit_form(field);
            }
        });
        self.push_deferred(handle);
    }
}

/// Insert the one-shot active-tab marker shortly after a navigation-eligible
/// event, guarded so it is only ever added once per session
fn schedule_active_tab_marker(shared: &Arc<RecorderShared>) {
    if shared
        .state
        .lock()
        .unwrap()
        .navigation
        .active_tab_marker_added()
    {
        return;
    }

    let task_shared = Arc::clone(shared);
    let delay = Duration::from_millis(shared.config.active_tab_delay_ms);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if task_shared.stop.load(Ordering::SeqCst) {
            return;
        }
        if !task_shared
            .state
            .lock()
            .unwrap()
            .navigation
            .try_claim_active_tab_marker()
        {
            return;
        }

        task_shared
            .commit(|session| {
                synthesizer::apply_append(session, synthesizer::active_tab_block())
            })
            .await;
    });
    shared.push_deferred(handle);
}

/// One tick of the navigation watcher
async fn poll_navigation(shared: &Arc<RecorderShared>) {
    let url = shared.host.current_url();
    let navigated = shared.state.lock().unwrap().navigation.observe(&url);
    let Some(url) = navigated else { return };

    info!(%url, "recording user navigation");
    let block = synthesizer::navigate_block(url, shared.config.navigate_timeout_ms);
    shared
        .commit(|session| synthesizer::apply_append(session, block))
        .await;

    schedule_active_tab_marker(shared);
}

/// Records a user's live interaction with a page into the session store
///
/// Install wires the recorder onto the document; every raw event is then
/// fed through [`SessionRecorder::dispatch`]. Teardown removes all
/// listeners, cancels pending timers and tasks, and resets every piece of
/// ephemeral state so a repeated install behaves as a fresh session.
pub struct SessionRecorder {
    shared: Arc<RecorderShared>,
    installed: bool,
    scroll_debouncer: Option<Debouncer<ScrollEvent>>,
    input_debouncer: Option<Debouncer<(String, InputEvent)>>,
    frame_debouncer: Option<Arc<Debouncer<InboundFrameMessage>>>,
    navigation_task: Option<JoinHandle<()>>,
    frame_task: Option<JoinHandle<()>>,
}

impl SessionRecorder {
    pub fn new(
        config: RecorderConfig,
        store: Arc<dyn SessionStore>,
        resolver: Arc<dyn SelectorResolver>,
        host: Arc<dyn PageHost>,
        feedback: Arc<dyn FeedbackSignal>,
        channel: Arc<dyn FrameChannel>,
    ) -> Self {
        let (block_tx, _) = broadcast::channel(100);

        Self {
            shared: Arc::new(RecorderShared {
                config,
                store,
                resolver,
                host,
                feedback,
                channel,
                state: Mutex::new(RecorderState::default()),
                block_tx,
                stop: Arc::new(AtomicBool::new(false)),
                deferred: Mutex::new(Vec::new()),
            }),
            installed: false,
            scroll_debouncer: None,
            input_debouncer: None,
            frame_debouncer: None,
            navigation_task: None,
            frame_task: None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Get a stream of the blocks this recorder appends or updates
    pub fn block_stream(&self) -> impl Stream<Item = Block> {
        let mut rx = self.shared.block_tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(block) => yield block,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("block stream lagged, skipped {} blocks", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Attach the recorder to the document
    ///
    /// Returns `Ok(false)` without attaching anything when no recording
    /// session is currently active.
    pub async fn install(&mut self) -> Result<bool> {
        if self.installed {
            return Ok(true);
        }

        if !self.shared.store.recording_active().await? {
            debug!("no active recording session, recorder not installed");
            return Ok(false);
        }

        let top_frame = self.shared.host.is_top_frame();
        info!(top_frame, "installing session recorder");

        self.shared.stop.store(false, Ordering::SeqCst);
        *self.shared.state.lock().unwrap() = RecorderState::default();

        // Live value tracking for the focused text field
        let input_shared = Arc::clone(&self.shared);
        self.input_debouncer = Some(Debouncer::new(
            Duration::from_millis(self.shared.config.text_input_debounce_ms),
            move |(selector, event): (String, InputEvent)| {
                let shared = Arc::clone(&input_shared);
                async move {
                    shared.on_input_settled(selector, event).await;
                }
            },
        ));

        if top_frame {
            if self.shared.config.record_scroll {
                let scroll_shared = Arc::clone(&self.shared);
                self.scroll_debouncer = Some(Debouncer::new(
                    Duration::from_millis(self.shared.config.scroll_debounce_ms),
                    move |event: ScrollEvent| {
                        let shared = Arc::clone(&scroll_shared);
                        async move {
                            shared.on_scroll_settled(event).await;
                        }
                    },
                ));
            }

            // Cross-frame relay: compose and persist forwarded sessions
            let composer = Arc::new(Mutex::new(FrameComposer::new()));
            let relay_shared = Arc::clone(&self.shared);
            let frame_debouncer = Arc::new(Debouncer::new(
                Duration::from_millis(self.shared.config.frame_message_debounce_ms),
                move |inbound: InboundFrameMessage| {
                    let shared = Arc::clone(&relay_shared);
                    let composer = Arc::clone(&composer);
                    async move {
                        if shared.stop.load(Ordering::SeqCst) {
                            return;
                        }

                        let composed = composer.lock().unwrap().compose(inbound, shared.host.as_ref());
                        let Some(session) = composed else { return };

                        let tail = session.tail().cloned();
                        if let Err(e) = shared.store.set(session).await {
                            error!("failed to persist relayed recording session: {e}");
                            return;
                        }
                        if let Some(block) = tail {
                            let _ = shared.block_tx.send(block);
                        }
                    }
                },
            ));

            let mut rx = self.shared.channel.subscribe();
            let stop = Arc::clone(&self.shared.stop);
            let task_debouncer = Arc::clone(&frame_debouncer);
            self.frame_task = Some(tokio::spawn(async move {
                while let Some(inbound) = rx.recv().await {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    task_debouncer.call(inbound);
                }
            }));
            self.frame_debouncer = Some(frame_debouncer);

            if self.shared.config.record_navigation {
                self.shared
                    .state
                    .lock()
                    .unwrap()
                    .navigation
                    .prime(self.shared.host.current_url());

                let poll_shared = Arc::clone(&self.shared);
                let period =
                    Duration::from_millis(self.shared.config.navigation_poll_interval_ms);
                self.navigation_task = Some(tokio::spawn(async move {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    // The first tick completes immediately
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        if poll_shared.stop.load(Ordering::SeqCst) {
                            break;
                        }
                        poll_navigation(&poll_shared).await;
                    }
                }));
            }

            schedule_active_tab_marker(&self.shared);
        }

        // Adopt an already-focused text field as if focus-in had just fired
        if let Some(target) = self.shared.host.focused_element() {
            if target.tag.is_text_field() {
                self.shared.on_focus_in(FocusEvent { target });
            }
        }

        self.installed = true;
        Ok(true)
    }

    /// Feed one raw page event through the synthesis pipeline
    ///
    /// The returned disposition is computed synchronously from the event
    /// snapshot, so the host glue can cancel the default action in the
    /// same tick.
    pub async fn dispatch(&self, event: PageEvent) -> EventDisposition {
        if !self.installed {
            return EventDisposition::pass();
        }

        match event {
            PageEvent::Click(event) => self.shared.on_click(event).await,
            PageEvent::Change(event) => {
                self.shared.on_change(event).await;
                EventDisposition::pass()
            }
            PageEvent::KeyDown(event) => self.shared.on_key_down(event).await,
            PageEvent::Input(event) => {
                self.queue_input(event);
                EventDisposition::pass()
            }
            PageEvent::Scroll(event) => {
                self.queue_scroll(event);
                EventDisposition::pass()
            }
            PageEvent::FocusIn(event) => {
                self.shared.on_focus_in(event);
                EventDisposition::pass()
            }
            PageEvent::FocusOut(event) => {
                self.shared.on_focus_out(event);
                EventDisposition::pass()
            }
            PageEvent::BeforeUnload => {
                self.shared
                    .state
                    .lock()
                    .unwrap()
                    .navigation
                    .mark_user_navigation();
                EventDisposition::pass()
            }
        }
    }

    fn queue_input(&self, event: InputEvent) {
        let tracked = {
            let state = self.shared.state.lock().unwrap();
            state
                .tracked_field
                .clone()
                .filter(|tracked| tracked.node == event.target.node)
        };

        let (Some(tracked), Some(debouncer)) = (tracked, self.input_debouncer.as_ref()) else {
            return;
        };
        debouncer.call((tracked.selector, event));
    }

    fn queue_scroll(&self, event: ScrollEvent) {
        if let Some(debouncer) = self.scroll_debouncer.as_ref() {
            debouncer.call(event);
        }
    }

    /// Detach the recorder and reset all ephemeral state
    ///
    /// A repeated install afterwards behaves as a fresh session: no timer,
    /// task, or flag survives.
    pub fn teardown(&mut self) {
        info!("tearing down session recorder");

        self.shared.stop.store(true, Ordering::SeqCst);

        if let Some(debouncer) = self.scroll_debouncer.take() {
            debouncer.cancel();
        }
        if let Some(debouncer) = self.input_debouncer.take() {
            debouncer.cancel();
        }
        if let Some(debouncer) = self.frame_debouncer.take() {
            debouncer.cancel();
        }
        if let Some(task) = self.navigation_task.take() {
            task.abort();
        }
        if let Some(task) = self.frame_task.take() {
            task.abort();
        }

        for handle in self.shared.deferred.lock().unwrap().drain(..) {
            handle.abort();
        }

        let mut state = self.shared.state.lock().unwrap();
        state.capture.reset();
        state.navigation.reset();
        state.tracked_field = None;
        drop(state);

        self.installed = false;
    }
}
