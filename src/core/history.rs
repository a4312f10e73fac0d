//! Transition history kept by each machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Number of transitions a machine keeps unless configured otherwise.
pub const DEFAULT_HISTORY_LEN: usize = 64;

/// Record of one successful transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State name the machine left
    pub from: String,
    /// State name the machine entered
    pub to: String,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

impl TransitionRecord {
    pub fn now(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            timestamp: Utc::now(),
        }
    }
}

fn default_max_len() -> usize {
    DEFAULT_HISTORY_LEN
}

/// Bounded log of the most recent transitions, oldest first.
///
/// Once `max_len` records are held, each new record evicts the oldest one.
/// A `max_len` of zero turns recording off.
///
/// # Example
///
/// ```rust
/// use posture::core::{TransitionLog, TransitionRecord};
///
/// let mut log = TransitionLog::with_max_len(2);
/// log.push(TransitionRecord::now("Idle", "Combat"));
/// log.push(TransitionRecord::now("Combat", "Idle"));
/// log.push(TransitionRecord::now("Idle", "Flee"));
///
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.path(), vec!["Combat", "Idle", "Flee"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionLog {
    transitions: VecDeque<TransitionRecord>,
    #[serde(default = "default_max_len")]
    max_len: usize,
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::with_max_len(DEFAULT_HISTORY_LEN)
    }
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(max_len.min(DEFAULT_HISTORY_LEN)),
            max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Change the limit, dropping the oldest records that no longer fit.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
        self.evict(0);
    }

    /// Append `transition`, evicting the oldest record when full.
    pub fn push(&mut self, transition: TransitionRecord) {
        if self.max_len == 0 {
            return;
        }
        self.evict(1);
        self.transitions.push_back(transition);
    }

    fn evict(&mut self, room: usize) {
        let keep = self.max_len.saturating_sub(room);
        while self.transitions.len() > keep {
            self.transitions.pop_front();
        }
    }

    /// State names visited: the oldest kept `from`, then every `to`.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from.as_str());
        }
        path.extend(self.transitions.iter().map(|t| t.to.as_str()));
        path
    }

    /// Time between the oldest kept and the last transition.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.transitions.back()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
