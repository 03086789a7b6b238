use super::identifier::ProblemIdentifier;

/// Transient per-page state threaded through the reconciler. `current` is
/// `None` until the assistant has been injected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current: Option<ProblemIdentifier>,
    pub panel_open: bool,
}

impl SessionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn tracking(identifier: ProblemIdentifier) -> Self {
        Self {
            current: Some(identifier),
            panel_open: false,
        }
    }

    pub fn with_panel_open(mut self, open: bool) -> Self {
        self.panel_open = open;
        self
    }

    pub fn is_tracking(&self, identifier: &ProblemIdentifier) -> bool {
        self.current.as_ref() == Some(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle_with_panel_closed() {
        let state = SessionState::idle();
        assert!(state.current.is_none());
        assert!(!state.panel_open);
    }

    #[test]
    fn tracking_state_reports_identifier() {
        let state = SessionState::tracking("two-sum".into());
        assert!(state.is_tracking(&"two-sum".into()));
        assert!(!state.is_tracking(&"three-sum".into()));
    }
}
