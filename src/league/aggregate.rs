//! Grand-prix subtotals, total score and overall rank.

use super::ledger::{GRAND_PRIX_COUNT, Ledger, RACES_PER_GRAND_PRIX};

/// Points awarded per finishing position, 1st through 12th.
pub const POINTS_TABLE: [u32; 12] = [15, 12, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1];

/// Point value of a rank label such as "1st" or "12th".
///
/// The leading number decides the position; anything unreadable or outside
/// 1-12 scores zero.
pub fn points_for(rank_label: &str) -> u32 {
    let digits: String = rank_label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<usize>() {
        Ok(position) if (1..=POINTS_TABLE.len()).contains(&position) => POINTS_TABLE[position - 1],
        _ => 0,
    }
}

/// English ordinal label for a 1-based position.
///
/// Only 1, 2 and 3 get their own suffix; everything else is "th", including
/// 21, 22 and 23. Positions here never exceed 12, so this never shows.
pub fn ordinal(position: usize) -> String {
    let suffix = match position {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{}{}", position, suffix)
}

/// Returns the ledger with every derived field refreshed. Idempotent.
pub fn recalculate(ledger: &Ledger) -> Ledger {
    let mut players = ledger.players().to_vec();

    for player in &mut players {
        let points: Vec<u32> = player
            .ranks
            .iter()
            .map(|slot| slot.as_deref().map(points_for).unwrap_or(0))
            .collect();

        for gp in 0..GRAND_PRIX_COUNT {
            let start = gp * RACES_PER_GRAND_PRIX;
            let end = start + RACES_PER_GRAND_PRIX;
            // A grand prix closes once its last race is recorded
            player.grand_prix[gp] = if player.ranks[end - 1].is_some() {
                Some(points[start..end].iter().sum())
            } else {
                None
            };
        }

        player.total = points.iter().sum();
    }

    // Stable: ties keep ledger order
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| players[b].total.cmp(&players[a].total));
    for (position, &index) in order.iter().enumerate() {
        players[index].rank = Some(ordinal(position + 1));
    }

    Ledger::from_players(players)
}
