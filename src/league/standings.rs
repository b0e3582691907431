//! Team-level view of the ledger.

use serde::Serialize;

use super::ledger::Ledger;
use super::session::TeamConfig;
use super::shock::ShockLog;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStanding {
    pub label: String,
    pub players: usize,
    pub total: u32,
    pub shocks: usize,
}

/// Sums player totals per configured team, matching players by the color
/// qualifier in their team label. Unassigned players count for neither team.
pub fn team_standings(ledger: &Ledger, teams: &[TeamConfig; 2], shocks: &ShockLog) -> [TeamStanding; 2] {
    teams.clone().map(|team| {
        let label = team.label();
        let members = ledger.players().iter().filter(|p| team.owns(&p.team));
        let (players, total) = members.fold((0, 0), |(n, sum), p| (n + 1, sum + p.total));
        TeamStanding {
            shocks: shocks.count_for(&label),
            label,
            players,
            total,
        }
    })
}
