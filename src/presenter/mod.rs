//! Overlay presenter
//!
//! State machine for the floating result panel:
//!
//! ```text
//! Hidden -> Positioning -> Loading -> Success | Error
//!    ^__________________________________________|
//! ```
//!
//! `hide` is reachable from every state. Rendering is left to the host; this
//! type only decides which outcome may be shown for which target.

use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::AnalysisOutcome;
use crate::metrics::HoverMetrics;
use crate::normalizer::ViewModel;
use crate::resolver::TargetId;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayState {
    #[default]
    Hidden,
    Positioning { target: TargetId },
    Loading { target: TargetId },
    Success { target: TargetId, view: ViewModel },
    Error { target: TargetId, message: String },
}

impl OverlayState {
    /// The target the overlay is attached to, if visible
    pub fn target(&self) -> Option<TargetId> {
        match self {
            OverlayState::Hidden => None,
            OverlayState::Positioning { target }
            | OverlayState::Loading { target }
            | OverlayState::Success { target, .. }
            | OverlayState::Error { target, .. } => Some(*target),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OverlayState::Hidden => "hidden",
            OverlayState::Positioning { .. } => "positioning",
            OverlayState::Loading { .. } => "loading",
            OverlayState::Success { .. } => "success",
            OverlayState::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Default)]
pub struct OverlayPresenter {
    state: Mutex<OverlayState>,
}

impl OverlayPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the overlay to `target`, replacing whatever it showed before
    pub fn position(&self, target: TargetId) {
        *self.state.lock() = OverlayState::Positioning { target };
        tracing::trace!(target_id = %target, "Overlay positioned");
    }

    /// Switch to the loading state if the overlay is attached to `target`
    ///
    /// Returns false when the overlay is hidden or follows another target.
    pub fn show_loading(&self, target: TargetId) -> bool {
        let mut state = self.state.lock();
        if state.target() != Some(target) {
            return false;
        }
        *state = OverlayState::Loading { target };
        true
    }

    /// Show `outcome` if `target` is still the tracked target
    ///
    /// Returns false, leaving the state untouched, for stale resolutions.
    pub fn apply(&self, target: TargetId, outcome: &AnalysisOutcome) -> bool {
        let mut state = self.state.lock();
        if state.target() != Some(target) {
            HoverMetrics::global().stale_discards.inc();
            tracing::debug!(
                target_id = %target,
                tracked = ?state.target(),
                "Discarding stale analysis result"
            );
            return false;
        }

        *state = match outcome {
            AnalysisOutcome::Success(view) => OverlayState::Success {
                target,
                view: view.clone(),
            },
            AnalysisOutcome::Failure { message, .. } => OverlayState::Error {
                target,
                message: message.clone(),
            },
        };
        true
    }

    pub fn hide(&self) {
        *self.state.lock() = OverlayState::Hidden;
    }

    /// Hide only if the overlay belongs to `target`
    pub fn hide_for(&self, target: TargetId) -> bool {
        let mut state = self.state.lock();
        if state.target() == Some(target) {
            *state = OverlayState::Hidden;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state.lock().clone()
    }

    pub fn tracked_target(&self) -> Option<TargetId> {
        self.state.lock().target()
    }
}
