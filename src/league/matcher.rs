//! Master roster matching.
//!
//! Decides which known canonical player an OCR'd name refers to. OCR misreads
//! drop or alter characters but rarely reorder them, so matching is done with
//! prefix and substring tests on the normalized form.

use std::collections::HashMap;

use super::normalize::normalize;

/// Upper bound on distinct players in a league.
pub const MAX_PLAYERS: usize = 12;

/// Substring matches are only trusted for names longer than this.
const MIN_SUBSTRING_LEN: usize = 5;

/// Resolves a raw name against the roster.
///
/// Returns the canonical roster name on a match, the raw name itself when it
/// looks like a new player and the roster still has room, or an empty string
/// when the roster is full and nothing matched (the row must be dropped).
pub fn resolve(raw_name: &str, roster: &[String]) -> String {
    if roster.is_empty() {
        return raw_name.to_string();
    }

    let wanted = normalize(raw_name);

    // Later duplicates overwrite earlier ones
    let canonical_by_normalized: HashMap<String, &String> = roster
        .iter()
        .map(|name| (normalize(name), name))
        .collect();

    if !wanted.is_empty() {
        let hit = roster
            .iter()
            .map(|name| normalize(name))
            .find(|candidate| is_match(&wanted, candidate));

        if let Some(candidate) = hit {
            if let Some(canonical) = canonical_by_normalized.get(&candidate) {
                return (*canonical).clone();
            }
        }
    }

    if roster.len() < MAX_PLAYERS {
        raw_name.to_string()
    } else {
        String::new()
    }
}

/// The single match predicate, rules in order of preference.
fn is_match(wanted: &str, candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }

    wanted == candidate
        || wanted.starts_with(candidate)
        || candidate.starts_with(wanted)
        || (candidate.chars().count() > MIN_SUBSTRING_LEN && candidate.contains(wanted))
        || (wanted.chars().count() > MIN_SUBSTRING_LEN && wanted.contains(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn full_roster() -> Vec<String> {
        roster(&[
            "Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace", "Heidi", "Ivan", "Judy",
            "Mallory", "Niaj",
        ])
    }

    #[test]
    fn test_empty_roster_accepts_verbatim() {
        assert_eq!(resolve("  weird NAME ", &[]), "  weird NAME ");
    }

    #[test]
    fn test_exact_normalized_match() {
        let r = roster(&["Alice", "Bob"]);
        assert_eq!(resolve("BOB", &r), "Bob");
        assert_eq!(resolve("alice", &r), "Alice");
    }

    #[test]
    fn test_prefix_dropped_by_ocr() {
        let r = roster(&["DS-Alice"]);
        assert_eq!(resolve("alice ", &r), "DS-Alice");
    }

    #[test]
    fn test_roster_name_is_prefix_of_raw() {
        let r = roster(&["Bob"]);
        assert_eq!(resolve("Bobby", &r), "Bob");
    }

    #[test]
    fn test_raw_is_prefix_of_roster_name() {
        let r = roster(&["Christopher"]);
        assert_eq!(resolve("Chris", &r), "Christopher");
    }

    #[test]
    fn test_substring_requires_long_roster_name() {
        let r = roster(&["Maximilian"]);
        assert_eq!(resolve("ximil", &r), "Maximilian");

        // "ann" inside "joann" but the roster name is too short
        let r = roster(&["JoAnn"]);
        assert_eq!(resolve("ann", &r), "ann");
    }

    #[test]
    fn test_substring_requires_long_raw_name() {
        let r = roster(&["Zed"]);
        assert_eq!(resolve("TheZedKing", &r), "Zed");
    }

    #[test]
    fn test_first_roster_entry_wins() {
        let r = roster(&["Sam", "Samantha"]);
        assert_eq!(resolve("Samantha", &r), "Sam");
        let r = roster(&["Samantha", "Sam"]);
        assert_eq!(resolve("Samantha", &r), "Samantha");
    }

    #[test]
    fn test_normalization_collision_last_write_wins() {
        let r = roster(&["Alex", "ALEX!"]);
        assert_eq!(resolve("alex", &r), "ALEX!");
    }

    #[test]
    fn test_unknown_name_with_room_is_new_player() {
        let r = roster(&["Alice", "Bob"]);
        assert_eq!(resolve("Zoe", &r), "Zoe");
    }

    #[test]
    fn test_full_roster_rejects_unknown() {
        assert_eq!(resolve("Xq7#", &full_roster()), "");
    }

    #[test]
    fn test_full_roster_still_matches_known() {
        assert_eq!(resolve("mallory.", &full_roster()), "Mallory");
    }

    #[test]
    fn test_punctuation_only_name_never_fuzzy_matches() {
        let r = roster(&["Alice"]);
        assert_eq!(resolve("!!!", &r), "!!!");
        assert_eq!(resolve("!!!", &full_roster()), "");
    }

    #[test]
    fn test_empty_normalized_roster_entry_matches_nothing() {
        let r = roster(&["???", "Bob"]);
        assert_eq!(resolve("Alice", &r), "Alice");
        assert_eq!(resolve("Bobby", &r), "Bob");
    }

    #[test]
    fn test_deterministic() {
        let r = full_roster();
        for name in ["ali", "Bobby", "nobody", "IVAN", ""] {
            assert_eq!(resolve(name, &r), resolve(name, &r));
        }
    }
}
