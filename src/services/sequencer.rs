//! Last-request-wins bookkeeping for background fetches

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Issues increasing tickets; only the newest one may apply its result.
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct FetchSequencer {
    latest: Arc<AtomicU64>,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch, superseding every earlier ticket
    pub fn issue(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Supersede any outstanding fetch without starting a new one
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_latest_ticket_wins() {
        let seq = FetchSequencer::new();
        let first = seq.issue();
        let second = seq.issue();

        assert!(first < second);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_invalidate_drops_outstanding() {
        let seq = FetchSequencer::new();
        let ticket = seq.issue();
        seq.invalidate();
        assert!(!seq.is_current(ticket));
    }

    #[test]
    fn test_clones_share_counter() {
        let seq = FetchSequencer::new();
        let handle = seq.clone();
        let ticket = seq.issue();
        assert!(handle.is_current(ticket));
        handle.issue();
        assert!(!seq.is_current(ticket));
    }

    #[test]
    fn test_out_of_order_completion_keeps_newest() {
        let seq = FetchSequencer::new();
        let (tx, rx) = std::sync::mpsc::channel();

        let slow = seq.issue();
        let fast = seq.issue();
        let tx_fast = tx.clone();
        thread::spawn(move || tx_fast.send((fast, "fast")).unwrap())
            .join()
            .unwrap();
        thread::spawn(move || tx.send((slow, "slow")).unwrap())
            .join()
            .unwrap();

        let applied: Vec<&str> = rx
            .iter()
            .take(2)
            .filter(|(ticket, _)| seq.is_current(*ticket))
            .map(|(_, label)| label)
            .collect();
        assert_eq!(applied, vec!["fast"]);
    }

    #[test]
    fn test_concurrent_issue_is_unique() {
        let seq = FetchSequencer::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                thread::spawn(move || (0..100).map(|_| seq.issue().id()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 800);
    }
}
