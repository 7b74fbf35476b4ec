//! Bounded in-memory buffer of recent broadcast messages, used only to
//! replay context to newly connected clients.

use std::collections::VecDeque;

use crate::events::BroadcastMessage;

/// Maximum number of broadcast messages retained.
pub const HISTORY_CAPACITY: usize = 100;
/// How many of the most recent messages are replayed on connect.
pub const REPLAY_COUNT: usize = 20;

/// FIFO buffer: oldest entry is dropped once capacity is exceeded.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    entries: VecDeque<BroadcastMessage>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a message, evicting the oldest beyond [`HISTORY_CAPACITY`].
    pub fn push(&mut self, message: BroadcastMessage) {
        self.entries.push_back(message);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// The most recent `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> Vec<BroadcastMessage> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn message(n: usize) -> BroadcastMessage {
        BroadcastMessage {
            from: "conn".to_string(),
            message: json!({ "seq": n }),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn push_beyond_capacity_evicts_oldest_first() {
        let mut buf = HistoryBuffer::new();
        for n in 0..HISTORY_CAPACITY + 1 {
            buf.push(message(n));
        }

        assert_eq!(buf.len(), HISTORY_CAPACITY);
        // Entry 0 was evicted; the buffer now spans 1..=100.
        let all = buf.recent(HISTORY_CAPACITY);
        assert_eq!(all[0].message["seq"], 1);
        assert_eq!(all[HISTORY_CAPACITY - 1].message["seq"], HISTORY_CAPACITY);
    }

    #[test]
    fn recent_returns_last_n_oldest_first() {
        let mut buf = HistoryBuffer::new();
        for n in 0..50 {
            buf.push(message(n));
        }

        let replay = buf.recent(REPLAY_COUNT);
        assert_eq!(replay.len(), REPLAY_COUNT);
        assert_eq!(replay[0].message["seq"], 30);
        assert_eq!(replay[REPLAY_COUNT - 1].message["seq"], 49);
    }

    #[test]
    fn recent_with_fewer_entries_returns_all() {
        let mut buf = HistoryBuffer::new();
        buf.push(message(0));
        buf.push(message(1));

        let replay = buf.recent(REPLAY_COUNT);
        assert_eq!(replay.len(), 2);
        assert_eq!(replay[0].message["seq"], 0);
    }

    #[test]
    fn empty_buffer_replays_nothing() {
        let buf = HistoryBuffer::new();
        assert!(buf.is_empty());
        assert!(buf.recent(REPLAY_COUNT).is_empty());
    }
}
