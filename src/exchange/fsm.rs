use crate::{Error, Result};
use tracing::{debug, info, warn};

// Exchange states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Collecting,
    Sending,
    Dispatching,
}

// Exchange events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeEvent {
    Confirmed,
    MessageReady,
    ReplyReceived,
    Finished,
    Aborted,
}

pub struct ExchangeStateMachine {
    state: ExchangeState,
}

impl Default for ExchangeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeStateMachine {
    pub fn new() -> Self {
        Self {
            state: ExchangeState::Idle,
        }
    }

    pub fn current_state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ExchangeState::Idle
    }

    pub fn transition(&mut self, event: ExchangeEvent) -> Result<()> {
        let old_state = self.state;
        debug!("Exchange processing event {:?} in state {:?}", event, old_state);

        let new_state = match (old_state, event) {
            (ExchangeState::Idle, ExchangeEvent::Confirmed) => ExchangeState::Collecting,
            (ExchangeState::Collecting, ExchangeEvent::MessageReady) => ExchangeState::Sending,
            (ExchangeState::Sending, ExchangeEvent::ReplyReceived) => ExchangeState::Dispatching,
            (ExchangeState::Dispatching, ExchangeEvent::Finished) => ExchangeState::Idle,
            (_, ExchangeEvent::Aborted) => ExchangeState::Idle,
            _ => {
                warn!(
                    "Invalid exchange transition from {:?} with event {:?}",
                    old_state, event
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", old_state),
                    requested: format!("{:?}", event),
                });
            }
        };

        if old_state != new_state {
            info!(
                "Exchange state transition: {:?} -> {:?} (event: {:?})",
                old_state, new_state, event
            );
        }

        self.state = new_state;
        Ok(())
    }
}
