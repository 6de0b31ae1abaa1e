//! Single-use log of accepted tokens, for replay protection.
//!
//! Freshness alone lets a photographed code be reused for its whole TTL.
//! With a [`ConsumptionLog`] enabled the validator accepts each token once.

use std::collections::{HashSet, VecDeque};

/// A bounded record of tokens that have already granted attendance.
///
/// Holds at most `capacity` tokens. Once full, recording a new token forgets
/// the oldest one. Re-recording a token that is already held does not make
/// it younger.
#[derive(Debug, Clone)]
pub struct ConsumptionLog {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ConsumptionLog {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `token`. Returns `false` if it was already recorded.
    pub fn record(&mut self, token: &str) -> bool {
        if self.seen.contains(token) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(token.to_owned());
        self.order.push_back(token.to_owned());
        true
    }

    pub fn contains(&self, token: &str) -> bool {
        self.seen.contains(token)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rejects_repeat() {
        let mut log = ConsumptionLog::new(4);
        assert!(log.record("a"));
        assert!(!log.record("a"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_record_beyond_capacity_forgets_oldest() {
        let mut log = ConsumptionLog::new(3);
        for t in ["a", "b", "c", "d"] {
            log.record(t);
        }
        assert!(!log.contains("a"));
        assert!(log.contains("b"));
        assert!(log.contains("d"));
        assert_eq!(log.len(), 3);

        log.record("e");
        assert!(!log.contains("b"));
        assert!(log.contains("c"));
    }

    #[test]
    fn test_repeat_does_not_refresh_age() {
        let mut log = ConsumptionLog::new(2);
        log.record("a");
        log.record("b");
        log.record("a");
        log.record("c");
        assert!(!log.contains("a"));
        assert!(log.contains("b"));
        assert!(log.contains("c"));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut log = ConsumptionLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.record("a");
        log.record("b");
        assert!(!log.contains("a"));
        assert!(log.contains("b"));
        assert!(!log.is_empty());
    }
}
