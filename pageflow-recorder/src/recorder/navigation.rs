use std::time::Duration;
use tokio::time::Instant;

/// Heuristic state separating user-driven navigation from incidental
/// navigation caused by forms and links
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    last_url: String,
    user_navigated: bool,
    suppress_until: Option<Instant>,
    active_tab_marker_added: bool,
}

impl NavigationState {
    /// Record the URL present when the recorder was installed, so the
    /// initial load never counts as a navigation
    pub fn prime(&mut self, url: impl Into<String>) {
        self.last_url = url.into();
    }

    /// Raised by the address-bar heuristic (Enter with no focused page
    /// element) or by a page unload
    pub fn mark_user_navigation(&mut self) {
        self.user_navigated = true;
    }

    /// Opened by a form submission or a same-tab link click; location
    /// changes inside the window are already explained by those blocks
    pub fn open_suppression_window(&mut self, window: Duration) {
        self.suppress_until = Some(Instant::now() + window);
    }

    fn suppressed(&self) -> bool {
        self.suppress_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Evaluate the current location against the last seen one
    ///
    /// Returns the new URL when a navigate block should be synthesized.
    /// The user-navigation flag is consumed by the evaluation regardless
    /// of the outcome.
    pub fn observe(&mut self, current_url: &str) -> Option<String> {
        if current_url == self.last_url {
            return None;
        }

        let previous = std::mem::replace(&mut self.last_url, current_url.to_string());
        let qualifies = self.user_navigated && !previous.is_empty() && !self.suppressed();
        self.user_navigated = false;

        qualifies.then(|| current_url.to_string())
    }

    /// One-shot claim on the active-tab marker; the first caller wins
    pub fn try_claim_active_tab_marker(&mut self) -> bool {
        if self.active_tab_marker_added {
            return false;
        }
        self.active_tab_marker_added = true;
        true
    }

    pub fn active_tab_marker_added(&self) -> bool {
        self.active_tab_marker_added
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
