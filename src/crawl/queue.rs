// src/crawl/queue.rs
// =============================================================================
// The traversal queue: remote directories still waiting to be listed.
//
// It is first-in, first-out, so directories are listed breadth-first:
// every directory at depth 1, then depth 2, and so on. The order is the
// same on every run against the same tree.
//
// Rust concepts:
// - VecDeque: push_back() adds to the end, pop_front() removes from the start
// - HashSet: To avoid listing the same directory twice
// =============================================================================

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct TraversalQueue {
    pending: VecDeque<String>,
    seen: HashSet<String>,
}

impl TraversalQueue {
    /// A queue holding only `start` ("" is the repository root)
    pub fn seeded(start: &str) -> Self {
        let mut queue = TraversalQueue::default();
        queue.push(start.to_string());
        queue
    }

    /// Adds a directory; returns false if it was queued before
    pub fn push(&mut self, remote_path: String) -> bool {
        if !self.seen.insert(remote_path.clone()) {
            return false;
        }
        self.pending.push_back(remote_path);
        true
    }

    pub fn pop(&mut self) -> Option<String> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = TraversalQueue::seeded("docs");
        queue.push("docs/a".to_string());
        queue.push("docs/b".to_string());

        assert_eq!(queue.pop().as_deref(), Some("docs"));
        queue.push("docs/a/deep".to_string());
        assert_eq!(queue.pop().as_deref(), Some("docs/a"));
        assert_eq!(queue.pop().as_deref(), Some("docs/b"));
        assert_eq!(queue.pop().as_deref(), Some("docs/a/deep"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut queue = TraversalQueue::seeded("");
        assert!(queue.push("src".to_string()));
        assert!(!queue.push("src".to_string()));
        assert!(!queue.push("".to_string()));
        assert_eq!(queue.pop().as_deref(), Some(""));
        assert_eq!(queue.pop().as_deref(), Some("src"));
        assert_eq!(queue.pop(), None);
    }
}
