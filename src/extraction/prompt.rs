use crate::league::RaceNumber;

/// Builds the instruction text sent alongside a scoreboard image.
pub fn build_prompt(race: RaceNumber, hints: &[String]) -> String {
    let mut prompt = format!(
        "This image is the final scoreboard of race {} in a 12-race league between two teams.\n\
         Read every player row from top to bottom and return a JSON array. Each element must be \
         an object with exactly these keys:\n\
         - \"playerName\": the player's name as displayed (empty string if unreadable)\n\
         - \"team\": the team name followed by its color in parentheses, e.g. \"Sharks (BLUE)\" \
         or \"Comets (RED)\"; empty string if unknown\n\
         - \"score\": the score shown for the player, as an integer\n\
         - \"rank\": the finishing position as an ordinal label such as \"1st\", \"2nd\", \"12th\"\n\
         Return only the JSON array, no commentary.",
        race
    );

    if !hints.is_empty() {
        prompt.push_str(
            "\nThe players in this league are expected to be (use these exact spellings when a \
             name on the board clearly refers to one of them): ",
        );
        prompt.push_str(&hints.join(", "));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_race_and_keys() {
        let prompt = build_prompt(RaceNumber::new(7).unwrap(), &[]);
        assert!(prompt.contains("race 7"));
        for key in ["\"playerName\"", "\"team\"", "\"score\"", "\"rank\""] {
            assert!(prompt.contains(key));
        }
        assert!(!prompt.contains("expected to be"));
    }

    #[test]
    fn test_prompt_lists_hints() {
        let hints = vec!["Alice".to_string(), "DS-Bob".to_string()];
        let prompt = build_prompt(RaceNumber::FIRST, &hints);
        assert!(prompt.ends_with("Alice, DS-Bob"));
    }
}
