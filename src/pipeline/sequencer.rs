//! Puts worker results back into race order.
//!
//! Retried jobs go to the back of the worker queue, so results can arrive out
//! of order. The ledger merge depends on earlier races being merged first, so
//! a result is held until every race submitted before it (by number) has come
//! back.

use std::collections::BTreeMap;

use crate::league::{RaceNumber, RaceResult};

#[derive(Debug, Default)]
pub struct RaceSequencer {
    /// Submitted races not yet returned, with a count for resubmissions
    outstanding: BTreeMap<RaceNumber, usize>,
    /// Returned results waiting on a lower outstanding race
    held: Vec<RaceResult>,
}

impl RaceSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a race submitted to the worker.
    pub fn expect(&mut self, race: RaceNumber) {
        *self.outstanding.entry(race).or_insert(0) += 1;
    }

    /// Accepts a result from the worker and returns every result that can now
    /// be merged, lowest race first.
    pub fn push(&mut self, result: RaceResult) -> Vec<RaceResult> {
        if let Some(count) = self.outstanding.get_mut(&result.race) {
            *count -= 1;
            if *count == 0 {
                self.outstanding.remove(&result.race);
            }
        }

        let index = self.held.partition_point(|r| r.race <= result.race);
        self.held.insert(index, result);

        let ready = match self.outstanding.keys().next() {
            Some(&lowest) => self.held.partition_point(|r| r.race < lowest),
            None => self.held.len(),
        };
        self.held.drain(..ready).collect()
    }

    /// Results held back waiting on an earlier race.
    pub fn held(&self) -> usize {
        self.held.len()
    }

    /// Races submitted and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.outstanding.values().sum()
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding.is_empty() && self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.outstanding.clear();
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race(n: u8) -> RaceNumber {
        RaceNumber::new(n).unwrap()
    }

    fn result(n: u8) -> RaceResult {
        RaceResult::new(format!("race{}.png", n), race(n), Vec::new())
    }

    fn numbers(results: &[RaceResult]) -> Vec<u8> {
        results.iter().map(|r| r.race.get()).collect()
    }

    #[test]
    fn test_in_order_results_pass_straight_through() {
        let mut seq = RaceSequencer::new();
        for n in 1..=3 {
            seq.expect(race(n));
        }
        assert_eq!(numbers(&seq.push(result(1))), vec![1]);
        assert_eq!(numbers(&seq.push(result(2))), vec![2]);
        assert_eq!(numbers(&seq.push(result(3))), vec![3]);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_later_race_held_until_retry_returns() {
        let mut seq = RaceSequencer::new();
        for n in 1..=3 {
            seq.expect(race(n));
        }
        // Race 1 was retried and came back last
        assert!(seq.push(result(2)).is_empty());
        assert!(seq.push(result(3)).is_empty());
        assert_eq!(seq.held(), 2);

        assert_eq!(numbers(&seq.push(result(1))), vec![1, 2, 3]);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_partial_release() {
        let mut seq = RaceSequencer::new();
        for n in 1..=4 {
            seq.expect(race(n));
        }
        assert!(seq.push(result(3)).is_empty());
        assert_eq!(numbers(&seq.push(result(1))), vec![1]);
        assert_eq!(numbers(&seq.push(result(2))), vec![2, 3]);
        assert_eq!(seq.outstanding(), 1);
        assert_eq!(numbers(&seq.push(result(4))), vec![4]);
    }

    #[test]
    fn test_reprocessed_earlier_race_released_immediately() {
        let mut seq = RaceSequencer::new();
        seq.expect(race(5));
        seq.expect(race(6));
        seq.expect(race(2));

        assert_eq!(numbers(&seq.push(result(2))), vec![2]);
        assert_eq!(seq.outstanding(), 2);
    }

    #[test]
    fn test_unexpected_result_released() {
        let mut seq = RaceSequencer::new();
        assert_eq!(numbers(&seq.push(result(7))), vec![7]);
    }

    #[test]
    fn test_resubmitted_race_waits_for_both_results() {
        let mut seq = RaceSequencer::new();
        seq.expect(race(3));
        seq.expect(race(3));
        seq.expect(race(4));

        assert!(seq.push(result(4)).is_empty());
        // Race 3 is still outstanding once, so its first result is held too
        assert!(seq.push(result(3)).is_empty());
        assert_eq!(seq.held(), 2);
        assert_eq!(seq.outstanding(), 1);

        // Both copies come out in arrival order, so the later one merges last
        let first = RaceResult::failed("race3.png", race(3), "HTTP 503");
        let second = RaceResult::new("race3_retake.png", race(3), Vec::new());
        let mut seq = RaceSequencer::new();
        seq.expect(race(3));
        seq.expect(race(3));
        seq.expect(race(4));
        seq.push(result(4));
        seq.push(first);
        let ready = seq.push(second);
        assert_eq!(numbers(&ready), vec![3, 3, 4]);
        assert_eq!(ready[0].source, "race3.png");
        assert_eq!(ready[1].source, "race3_retake.png");
        assert!(seq.is_idle());
    }

    #[test]
    fn test_clear() {
        let mut seq = RaceSequencer::new();
        seq.expect(race(1));
        seq.push(result(2));
        seq.clear();
        assert!(seq.is_idle());
    }
}
