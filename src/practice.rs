//! Practice rounds: a fixed set of scrambles for one event, worked through
//! in order like a competition round.

use serde::{Deserialize, Serialize};

use crate::scramble::{scramble_or_placeholder, ScrambleProvider};

/// Scrambles in a WCA average-of-5 round
pub const ROUND_SIZE: usize = 5;

/// Persisted form of a practice round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSnapshot {
    pub event_id: String,
    #[serde(default)]
    pub scrambles: Vec<String>,
    #[serde(default)]
    pub current_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeRound {
    event_id: String,
    scrambles: Vec<String>,
    index: usize,
}

impl PracticeRound {
    /// A fresh round of `count` scrambles, positioned on the first
    pub fn generate<P: ScrambleProvider + ?Sized>(
        provider: &mut P,
        event_id: &str,
        count: usize,
    ) -> Self {
        let scrambles = (0..count.max(1))
            .map(|_| scramble_or_placeholder(provider, event_id))
            .collect();
        tracing::debug!(event = event_id, count, "practice round generated");
        Self {
            event_id: event_id.to_string(),
            scrambles,
            index: 0,
        }
    }

    /// `None` for a snapshot with no event or no scrambles. An index past
    /// the end lands on the last scramble.
    pub fn from_snapshot(snapshot: PracticeSnapshot) -> Option<Self> {
        if snapshot.event_id.is_empty() || snapshot.scrambles.is_empty() {
            return None;
        }
        let index = snapshot.current_index.min(snapshot.scrambles.len() - 1);
        Some(Self {
            event_id: snapshot.event_id,
            scrambles: snapshot.scrambles,
            index,
        })
    }

    pub fn snapshot(&self) -> PracticeSnapshot {
        PracticeSnapshot {
            event_id: self.event_id.clone(),
            scrambles: self.scrambles.clone(),
            current_index: self.index,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn current(&self) -> &str {
        &self.scrambles[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.scrambles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrambles.is_empty()
    }

    pub fn can_go_next(&self) -> bool {
        self.index + 1 < self.scrambles.len()
    }

    pub fn can_go_previous(&self) -> bool {
        self.index > 0
    }

    /// Step forward; `false` on the last scramble
    pub fn next(&mut self) -> bool {
        if self.can_go_next() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Step back; `false` on the first scramble
    pub fn previous(&mut self) -> bool {
        if self.can_go_previous() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Replace every scramble and go back to the first
    pub fn regenerate<P: ScrambleProvider + ?Sized>(&mut self, provider: &mut P) {
        let fresh = Self::generate(provider, &self.event_id, self.scrambles.len());
        *self = fresh;
    }

    /// `Scramble 2/5`
    pub fn position_label(&self) -> String {
        format!("Scramble {}/{}", self.index + 1, self.scrambles.len())
    }
}
