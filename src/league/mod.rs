//! Race-result reconciliation.
//!
//! Turns independently OCR'd, noisy per-race result sets into one running
//! league table:
//! - `normalize`: name canonicalization for comparison
//! - `matcher`: maps a raw name onto the known roster
//! - `ledger`: the cross-race player ledger and the race merger
//! - `aggregate`: grand-prix subtotals, totals and overall rank
//! - `shock`: per-race shock events
//! - `session`: the owned application state tying these together

pub mod aggregate;
pub mod ledger;
pub mod matcher;
pub mod normalize;
pub mod race;
pub mod session;
pub mod shock;
pub mod standings;

pub use ledger::{CanonicalPlayer, Ledger, LedgerError, UNASSIGNED_TEAM};
pub use race::{ExtractedRow, RaceNumber, RaceResult};
pub use session::{LeagueSession, TeamColor, TeamConfig};
pub use shock::ShockLog;
