use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::round::Round;

/// Season totals of one participant, always derived from stored rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub participant_name: String,
    pub total_points: u64,
    pub total_deviation: f64,
}

/// Folds rounds into a standings table.
///
/// Rounds are folded in `(season, round number)` order regardless of input
/// order, so shuffled input yields the same table including float sums.
/// Sorted by points descending, then cumulative deviation ascending;
/// remaining ties keep first-appearance order.
pub fn aggregate(rounds: &[Round]) -> Vec<StandingsEntry> {
    let mut ordered: Vec<&Round> = rounds.iter().collect();
    ordered.sort_by_key(|round| (round.season_id, round.round_number));

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut standings: Vec<StandingsEntry> = Vec::new();

    for entry in ordered.iter().flat_map(|round| round.entries.iter()) {
        let index = *positions
            .entry(entry.participant_name.as_str())
            .or_insert_with(|| {
                standings.push(StandingsEntry {
                    participant_name: entry.participant_name.clone(),
                    total_points: 0,
                    total_deviation: 0.0,
                });
                standings.len() - 1
            });

        let totals = &mut standings[index];
        totals.total_points += u64::from(entry.points);
        totals.total_deviation += entry.deviation;
    }

    // Stable sort keeps first-appearance order for exact ties
    standings.sort_by(compare_standings);
    standings
}

fn compare_standings(a: &StandingsEntry, b: &StandingsEntry) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| a.total_deviation.total_cmp(&b.total_deviation))
}
