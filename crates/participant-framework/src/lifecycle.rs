//! # Session Lifecycle
//!
//! Every participant walks the same path:
//!
//! ```text
//! Idle -> Connecting -> Subscribed -> AwaitingTerminalEvent -> Terminated
//!             |              |
//!             +-> Terminated +-> Terminated     (connect / subscribe failure)
//!             +-> Idle                          (connect abandoned)
//! ```
//!
//! [`SessionLifecycle`] enforces those edges and publishes the current state
//! on a `watch` channel so observers can wait for a given state.

use tokio::sync::watch;

/// Where a participant's session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Connecting,
    Subscribed,
    AwaitingTerminalEvent,
    Terminated,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Idle)
                | (Connecting, Subscribed)
                | (Connecting, Terminated)
                | (Subscribed, AwaitingTerminalEvent)
                | (Subscribed, Terminated)
                | (AwaitingTerminalEvent, Terminated)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid session transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: SessionState,
    pub to: SessionState,
}

/// The state machine owned by a single participant.
#[derive(Debug)]
pub struct SessionLifecycle {
    state: watch::Sender<SessionState>,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self { state }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Moves to `next`, returning the previous state.
    pub fn transition(&self, next: SessionState) -> Result<SessionState, InvalidTransition> {
        let mut previous = SessionState::Idle;
        let mut allowed = false;
        self.state.send_if_modified(|current| {
            previous = *current;
            allowed = current.can_transition_to(next);
            if allowed {
                *current = next;
            }
            allowed
        });
        if allowed {
            Ok(previous)
        } else {
            Err(InvalidTransition { from: previous, to: next })
        }
    }

    /// Waits until the state is `target` or `Terminated`, returning the one
    /// that was reached.
    pub async fn wait_for(&self, target: SessionState) -> SessionState {
        let mut rx = self.state.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if current == target || current == SessionState::Terminated {
                return current;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    #[test]
    fn test_happy_path() {
        let lifecycle = SessionLifecycle::new();
        assert_eq!(lifecycle.state(), Idle);

        assert_eq!(lifecycle.transition(Connecting), Ok(Idle));
        assert_eq!(lifecycle.transition(Subscribed), Ok(Connecting));
        assert_eq!(lifecycle.transition(AwaitingTerminalEvent), Ok(Subscribed));
        assert_eq!(lifecycle.transition(Terminated), Ok(AwaitingTerminalEvent));
        assert_eq!(lifecycle.state(), Terminated);
    }

    #[test]
    fn test_transitions_are_one_directional() {
        let lifecycle = SessionLifecycle::new();

        assert_eq!(
            lifecycle.transition(Subscribed),
            Err(InvalidTransition { from: Idle, to: Subscribed })
        );

        lifecycle.transition(Connecting).unwrap();
        lifecycle.transition(Terminated).unwrap();
        assert!(lifecycle.transition(Idle).is_err());
        assert!(lifecycle.transition(Connecting).is_err());
        assert_eq!(lifecycle.state(), Terminated);
    }

    #[test]
    fn test_connect_can_fall_back_to_idle() {
        let lifecycle = SessionLifecycle::new();
        lifecycle.transition(Connecting).unwrap();
        assert_eq!(lifecycle.transition(Idle), Ok(Connecting));
        assert!(!AwaitingTerminalEvent.can_transition_to(Subscribed));
    }

    #[tokio::test]
    async fn test_wait_for_state() {
        let lifecycle = std::sync::Arc::new(SessionLifecycle::new());

        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait_for(AwaitingTerminalEvent).await })
        };

        lifecycle.transition(Connecting).unwrap();
        lifecycle.transition(Subscribed).unwrap();
        lifecycle.transition(AwaitingTerminalEvent).unwrap();
        assert_eq!(waiter.await.unwrap(), AwaitingTerminalEvent);

        // terminated sessions release waiters for any state
        let lifecycle = SessionLifecycle::new();
        lifecycle.transition(Connecting).unwrap();
        lifecycle.transition(Terminated).unwrap();
        assert_eq!(lifecycle.wait_for(Subscribed).await, Terminated);
    }
}
