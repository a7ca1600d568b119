//! When landmark edits trigger a recompute.

use landmark_linear::LinearMode;
use std::fmt;
use tracing::trace;

/// An event that may cause the registration to be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A landmark moved during an interactive drag.
    LandmarkMoved,
    /// An interactive drag finished.
    LandmarkDragEnded,
    /// The linear stage mode was changed.
    ModeChanged(LinearMode),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LandmarkMoved => write!(f, "landmark moved"),
            Self::LandmarkDragEnded => write!(f, "drag ended"),
            Self::ModeChanged(mode) => write!(f, "mode changed to {mode}"),
        }
    }
}

/// Recompute lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecomputeState {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// A hot-update move was accepted and will be computed next.
    PendingRecompute,
    /// A recompute is running.
    Computing,
}

/// State machine deciding which triggers start a recompute.
///
/// - `LandmarkMoved` is accepted only when hot update is on, and parks the
///   policy in [`RecomputeState::PendingRecompute`] until [`start`] is
///   called. Further moves while pending coalesce into the same recompute.
/// - `LandmarkDragEnded` and `ModeChanged` are always accepted and go
///   straight to [`RecomputeState::Computing`].
/// - Triggers arriving while [`RecomputeState::Computing`] are dropped, not
///   queued.
///
/// [`start`]: Self::start
///
/// # Example
///
/// ```
/// use landmark_registration::{RecomputePolicy, RecomputeState, Trigger};
///
/// let mut policy = RecomputePolicy::new(true);
/// assert!(policy.accept(Trigger::LandmarkMoved));
/// assert_eq!(policy.state(), RecomputeState::PendingRecompute);
///
/// policy.start();
/// assert_eq!(policy.state(), RecomputeState::Computing);
/// assert!(!policy.accept(Trigger::LandmarkDragEnded));
///
/// policy.finish();
/// assert_eq!(policy.state(), RecomputeState::Idle);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecomputePolicy {
    state: RecomputeState,
    hot_update: bool,
}

impl RecomputePolicy {
    /// Creates an idle policy.
    #[must_use]
    pub const fn new(hot_update: bool) -> Self {
        Self {
            state: RecomputeState::Idle,
            hot_update,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RecomputeState {
        self.state
    }

    /// Whether moves trigger recomputes.
    #[must_use]
    pub const fn hot_update(&self) -> bool {
        self.hot_update
    }

    /// Enables or disables hot update.
    pub fn set_hot_update(&mut self, hot_update: bool) {
        self.hot_update = hot_update;
    }

    /// Offers a trigger. Returns true if a recompute is owed.
    ///
    /// On true the state is [`RecomputeState::PendingRecompute`] for a
    /// hot-update move and [`RecomputeState::Computing`] otherwise. The
    /// caller then calls [`start`](Self::start), runs the recompute and
    /// calls [`finish`](Self::finish).
    pub fn accept(&mut self, trigger: Trigger) -> bool {
        match (self.state, trigger) {
            (RecomputeState::Computing, _) => {
                trace!(%trigger, "Recompute in progress, dropping trigger");
                false
            }
            (_, Trigger::LandmarkMoved) if !self.hot_update => {
                trace!(%trigger, "Hot update off, ignoring move");
                false
            }
            (_, Trigger::LandmarkMoved) => {
                trace!(%trigger, from = ?self.state, "Recompute pending");
                self.state = RecomputeState::PendingRecompute;
                true
            }
            (_, Trigger::LandmarkDragEnded | Trigger::ModeChanged(_)) => {
                self.start();
                true
            }
        }
    }

    /// Moves to [`RecomputeState::Computing`]. A no-op while already
    /// computing.
    pub fn start(&mut self) {
        if self.state != RecomputeState::Computing {
            trace!(from = ?self.state, "Starting recompute");
            self.state = RecomputeState::Computing;
        }
    }

    /// Returns to [`RecomputeState::Idle`].
    pub fn finish(&mut self) {
        self.state = RecomputeState::Idle;
    }
}
