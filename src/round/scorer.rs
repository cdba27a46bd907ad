use std::cmp::Ordering;

use super::{
    errors::RoundError,
    models::{Guess, ScoredEntry},
};

/// Points awarded by rank; ranks beyond the schema earn nothing
pub const POINTS_SCHEMA: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

pub fn points_for_rank(rank: u32) -> u32 {
    rank.checked_sub(1)
        .and_then(|index| POINTS_SCHEMA.get(index as usize))
        .copied()
        .unwrap_or(0)
}

/// Ranks guesses by distance to the winning number and assigns points.
///
/// Order is `(deviation asc, participant name asc)`, so ranks are always the
/// dense sequence `1..=N` even when deviations tie.
pub fn score_round(winning_number: f64, guesses: &[Guess]) -> Result<Vec<ScoredEntry>, RoundError> {
    if guesses.is_empty() {
        return Err(RoundError::InvalidInput(
            "A round needs at least one guess".to_string(),
        ));
    }
    if !winning_number.is_finite() {
        return Err(RoundError::InvalidInput(format!(
            "Winning number {winning_number} is not a finite number"
        )));
    }
    if let Some(guess) = guesses.iter().find(|g| !g.value.is_finite()) {
        return Err(RoundError::InvalidInput(format!(
            "Guess of {} is not a finite number",
            guess.participant_name
        )));
    }

    let mut entries: Vec<ScoredEntry> = guesses
        .iter()
        .map(|guess| ScoredEntry {
            participant_name: guess.participant_name.clone(),
            value: guess.value,
            deviation: (guess.value - winning_number).abs(),
            rank: 0,
            points: 0,
        })
        .collect();

    entries.sort_by(compare_entries);

    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position as u32 + 1;
        entry.points = points_for_rank(entry.rank);
    }

    Ok(entries)
}

fn compare_entries(a: &ScoredEntry, b: &ScoredEntry) -> Ordering {
    a.deviation
        .total_cmp(&b.deviation)
        .then_with(|| a.participant_name.cmp(&b.participant_name))
}
