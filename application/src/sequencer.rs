//! The event sequencer: sole writer of the session's ordered record.
//!
//! Every event passes through here. The sequencer owns the monotonic
//! sequence number, the session-global turn index, and the current
//! round/phase-state tags; fan-out workers return values and never touch
//! it. Each append durably flushes the structured log and the transcript
//! before the state machine advances.

use crate::ports::{Clock, SessionStore, StoreError};
use crate::transcript;
use council_domain::{Event, EventType, PhaseState};
use serde_json::Value;
use std::sync::Arc;

pub struct EventSequencer {
    session_id: String,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    seq: u64,
    turn_index: u64,
    round: u32,
    phase_state: PhaseState,
}

impl EventSequencer {
    pub fn new(
        session_id: impl Into<String>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            store,
            clock,
            seq: 0,
            turn_index: 0,
            round: 0,
            phase_state: PhaseState::Discussion,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn turn_index(&self) -> u64 {
        self.turn_index
    }

    /// Advance the session-global turn counter. Called once per speaker
    /// turn, across all phases.
    pub fn next_turn(&mut self) -> u64 {
        self.turn_index += 1;
        self.turn_index
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn set_phase_state(&mut self, state: PhaseState) {
        self.phase_state = state;
    }

    /// Append one event, flushing the event log and transcript.
    pub fn emit(
        &mut self,
        event_type: EventType,
        actor_id: Option<&str>,
        payload: Value,
    ) -> Result<Event, StoreError> {
        self.seq += 1;
        let event = Event {
            seq: self.seq,
            session_id: self.session_id.clone(),
            timestamp: self.clock.now_iso(),
            phase_state: self.phase_state,
            event_type,
            round: self.round,
            turn_index: self.turn_index,
            actor_id: actor_id.map(str::to_string),
            payload,
        };
        self.store.append_event(&event)?;
        if let Some(section) = transcript::render(&event) {
            self.store.append_transcript(&section)?;
        }
        Ok(event)
    }
}
