//! In-memory sorted set with the same ordering rules as Redis.

use std::collections::HashMap;

use greeter_core::NameCount;

/// Member → score map ordered on read.
///
/// Reads order by ascending score, ties broken by member bytes, which is
/// what `ZRANGE ... WITHSCORES` returns.
#[derive(Debug, Default)]
pub struct MemorySortedSet {
    scores: HashMap<String, i64>,
}

impl MemorySortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to `member`'s score, creating it at zero. Returns the new score.
    pub fn incr(&mut self, member: &str, delta: i64) -> i64 {
        let score = self.scores.entry(member.to_string()).or_insert(0);
        *score += delta;
        *score
    }

    /// Every member with its score rendered as a decimal string.
    pub fn range_with_scores(&self) -> Vec<NameCount> {
        let mut entries: Vec<(&String, &i64)> = self.scores.iter().collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.as_bytes().cmp(b.0.as_bytes())));
        entries
            .into_iter()
            .map(|(name, score)| NameCount::new(name.clone(), score.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incr_creates_and_accumulates() {
        let mut set = MemorySortedSet::new();
        assert_eq!(set.incr("Ada", 1), 1);
        assert_eq!(set.incr("Ada", 1), 2);
        assert_eq!(set.range_with_scores(), vec![NameCount::new("Ada", "2")]);
    }

    #[test]
    fn range_orders_by_score_then_member() {
        let mut set = MemorySortedSet::new();
        for _ in 0..3 {
            set.incr("zed", 1);
        }
        set.incr("bob", 1);
        set.incr("alice", 1);

        let names: Vec<_> = set
            .range_with_scores()
            .into_iter()
            .map(|nc| (nc.name, nc.count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("alice".to_string(), "1".to_string()),
                ("bob".to_string(), "1".to_string()),
                ("zed".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn empty_set_ranges_to_nothing() {
        let set = MemorySortedSet::new();
        assert!(set.range_with_scores().is_empty());
    }
}
