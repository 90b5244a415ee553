use crate::events::ElementSnapshot;

/// Literal placeholder substituted into a recorded value, resolved with a
/// user-supplied value at execution time
pub const PARAMETER_MARKER: &str = "{{parameter}}";

/// Whether a recorded value already carries a parameter marker
pub fn value_is_templated(value: &str) -> bool {
    value.contains("{{")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureMode {
    #[default]
    Idle,
    Capturing,
}

/// Tracks the in-field parameter-marking gesture
///
/// At most one parameter may be captured per recording session; the
/// one-shot flag only resets on full teardown.
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    mode: CaptureMode,
    start_index: usize,
    field_selector: Option<String>,
    original_value: String,
    already_used: bool,
}

/// Result of a capture chord press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordOutcome {
    /// Capture started; show the active cue on the field
    Started,
    /// The session's one parameter is already spent; show the rejection cue
    Rejected,
    /// Capture ended; write the templated value into the recording
    Finished {
        field_selector: String,
        templated_value: String,
    },
}

impl CaptureState {
    pub fn is_capturing(&self) -> bool {
        self.mode == CaptureMode::Capturing
    }

    pub fn already_used(&self) -> bool {
        self.already_used
    }

    /// Advance the state machine on a chord press inside a text field
    pub fn handle_chord(&mut self, target: &ElementSnapshot, selector: String) -> ChordOutcome {
        match self.mode {
            CaptureMode::Idle if self.already_used => ChordOutcome::Rejected,
            CaptureMode::Idle => {
                self.mode = CaptureMode::Capturing;
                self.start_index = target
                    .selection_start
                    .unwrap_or_else(|| target.value.chars().count());
                self.field_selector = Some(selector);
                self.original_value = target.value.clone();
                ChordOutcome::Started
            }
            CaptureMode::Capturing => {
                self.mode = CaptureMode::Idle;
                self.already_used = true;

                let end = target.selection_start.unwrap_or(self.start_index);
                let templated_value =
                    substitute_marker(&self.original_value, self.start_index, end);

                // The text the user sees in the field is left untouched;
                // only the recorded value is templated
                let field_selector = self.field_selector.take().unwrap_or(selector);

                ChordOutcome::Finished {
                    field_selector,
                    templated_value,
                }
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Replace the caret range `[start, end)` of `original` with the
/// parameter marker; indices are char-based and clamped into range
fn substitute_marker(original: &str, start: usize, end: usize) -> String {
    let len = original.chars().count();
    let start = start.min(len);
    let end = end.clamp(start, len);

    let mut out: String = original.chars().take(start).collect();
    out.push_str(PARAMETER_MARKER);
    out.extend(original.chars().skip(end));
    out
}
