//! Encoder lifecycle state machine.

/// Lifecycle state of an encoder.
///
/// ```text
/// Idle ──start──▶ Running ──stop──▶ Stopped
///                    ▲                 │
///                    └──────start──────┘
/// ```
///
/// `invalidate` clears negotiated state from any state without changing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Created, not yet started.
    #[default]
    Idle,
    /// Accepting encode calls.
    Running,
    /// Stopped; encode calls are dropped until the next start.
    Stopped,
}

/// Tracks the lifecycle state and validates transitions.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns `true` if encode calls are accepted.
    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// Moves to `Running`. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = LifecycleState::Running;
        true
    }

    /// Moves `Running` to `Stopped`. Returns `false` from any other state.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = LifecycleState::Stopped;
        true
    }
}
