use serde::Serialize;
use utoipa::ToSchema;

/// What the cycle is waiting for after a successful render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WaitMode {
    /// Only a manual refresh (or settings change) starts the next pass.
    Manual,
    /// Auto-refresh on; next pass after `seconds`.
    TimedInterval { seconds: u64 },
    /// Forced refresh after a fixed delay, no user control.
    FixedLongDelay { seconds: u64 },
}

impl WaitMode {
    /// Delay until the timer fires, `None` for [`WaitMode::Manual`].
    #[must_use]
    pub fn delay_secs(self) -> Option<u64> {
        match self {
            Self::Manual => None,
            Self::TimedInterval { seconds } | Self::FixedLongDelay { seconds } => Some(seconds),
        }
    }

    /// Whether the pass triggered by this wait must bypass the cache.
    #[must_use]
    pub fn forces_refetch(self) -> bool {
        matches!(self, Self::FixedLongDelay { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RefreshState {
    Idle,
    Fetching,
    Rendered,
    Waiting { wait: WaitMode },
    /// Last pass failed; the timer is halted until a manual refresh or a
    /// settings change.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    /// Start a pass (manual action, timer, settings change or startup).
    Trigger,
    Succeeded,
    Failed,
    /// Schedule the next pass.
    Arm(WaitMode),
}

impl RefreshState {
    /// Apply `event`, returning the next state or `None` if the transition
    /// is not allowed from `self`.
    #[must_use]
    pub fn apply(self, event: RefreshEvent) -> Option<Self> {
        use RefreshEvent as E;
        match (self, event) {
            (Self::Idle | Self::Rendered | Self::Waiting { .. } | Self::Failed, E::Trigger) => {
                Some(Self::Fetching)
            }
            (Self::Fetching, E::Succeeded) => Some(Self::Rendered),
            (Self::Fetching, E::Failed) => Some(Self::Failed),
            (Self::Rendered | Self::Waiting { .. }, E::Arm(wait)) => Some(Self::Waiting { wait }),
            _ => None,
        }
    }
}
