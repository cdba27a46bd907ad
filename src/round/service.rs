use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    errors::RoundError,
    models::{DeletedRound, Round, RoundNumber, RoundSummary},
    parser::parse_guesses,
    repository::RoundRepository,
    scorer::score_round,
};
use crate::season::{SeasonClock, SeasonId};
use crate::shared::AppState;
use crate::standings::{aggregate, StandingsEntry};

/// How often a submission re-derives its round number after losing a race
pub const MAX_SUBMIT_ATTEMPTS: u32 = 3;

/// Service for round submission, deletion and season queries
pub struct RoundService {
    repository: Arc<dyn RoundRepository>,
    clock: SeasonClock,
}

impl RoundService {
    pub fn new(repository: Arc<dyn RoundRepository>, clock: SeasonClock) -> Self {
        Self { repository, clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.round_repository), state.season_clock)
    }

    pub fn current_season_at(&self, now: DateTime<Utc>) -> Result<SeasonId, RoundError> {
        Ok(self.clock.season_for(now)?)
    }

    /// Parses, scores and stores a round in the current season
    pub async fn submit_round(
        &self,
        winning_number: f64,
        guess_text: &str,
    ) -> Result<Round, RoundError> {
        self.submit_round_at(Utc::now(), winning_number, guess_text)
            .await
    }

    /// Parses, scores and stores a round in the season containing `now`.
    ///
    /// Everything is validated before the first write, so a rejected
    /// submission never leaves a partial round behind.
    #[instrument(skip(self, guess_text))]
    pub async fn submit_round_at(
        &self,
        now: DateTime<Utc>,
        winning_number: f64,
        guess_text: &str,
    ) -> Result<Round, RoundError> {
        let season = self.current_season_at(now)?;

        let guesses = parse_guesses(guess_text).map_err(|e| {
            warn!(error = %e, "Rejected guess input");
            RoundError::from(e)
        })?;
        let entries = score_round(winning_number, &guesses)?;

        debug!(season, guess_count = entries.len(), "Round scored, storing");

        let mut attempt = 1;
        let round_number = loop {
            match self
                .repository
                .append_round(season, winning_number, &entries)
                .await
            {
                Ok(round_number) => break round_number,
                Err(RoundError::Conflict { round, .. }) if attempt < MAX_SUBMIT_ATTEMPTS => {
                    warn!(season, round, attempt, "Round number conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            season,
            round = round_number,
            entry_count = entries.len(),
            winner = entries.first().map(|e| e.participant_name.as_str()),
            "Round submitted successfully"
        );

        Ok(Round {
            season_id: season,
            round_number,
            winning_number,
            entries,
        })
    }

    /// Deletes the most recent round of the current season
    pub async fn delete_last_round(&self) -> Result<DeletedRound, RoundError> {
        self.delete_last_round_at(Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn delete_last_round_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<DeletedRound, RoundError> {
        let season = self.current_season_at(now)?;
        let deleted = self.repository.delete_last_round(season).await?;

        info!(
            season = deleted.season,
            round = deleted.round,
            deleted_entries = deleted.deleted_entries,
            "Last round deleted"
        );

        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub async fn list_rounds(&self, season: SeasonId) -> Result<Vec<RoundSummary>, RoundError> {
        self.repository.list_rounds(season).await
    }

    #[instrument(skip(self))]
    pub async fn get_round(
        &self,
        season: SeasonId,
        round: RoundNumber,
    ) -> Result<Round, RoundError> {
        self.repository
            .get_round(season, round)
            .await?
            .ok_or_else(|| RoundError::NotFound(format!("Round {round} of season {season}")))
    }

    #[instrument(skip(self))]
    pub async fn list_seasons(&self) -> Result<Vec<SeasonId>, RoundError> {
        self.repository.list_seasons().await
    }

    /// Standings of `season`, recomputed from every stored round
    #[instrument(skip(self))]
    pub async fn standings(&self, season: SeasonId) -> Result<Vec<StandingsEntry>, RoundError> {
        let rounds = self.repository.season_rounds(season).await?;
        let standings = aggregate(&rounds);

        debug!(
            season,
            round_count = rounds.len(),
            participant_count = standings.len(),
            "Standings aggregated"
        );

        Ok(standings)
    }

    /// Distinct participant names of `season` in alphabetical order
    #[instrument(skip(self))]
    pub async fn participants(&self, season: SeasonId) -> Result<Vec<String>, RoundError> {
        let mut names: Vec<String> = self
            .standings(season)
            .await?
            .into_iter()
            .map(|entry| entry.participant_name)
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::{models::ScoredEntry, repository::InMemoryRoundRepository};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use tokio::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 10, 18, 0, 0).unwrap()
    }

    fn service(repo: Arc<dyn RoundRepository>) -> RoundService {
        RoundService::new(repo, SeasonClock::default())
    }

    /// Repository that loses the round-number race a fixed number of times
    struct ConflictingRepository {
        inner: InMemoryRoundRepository,
        conflicts_left: Mutex<u32>,
    }

    impl ConflictingRepository {
        fn new(conflicts: u32) -> Self {
            Self {
                inner: InMemoryRoundRepository::new(),
                conflicts_left: Mutex::new(conflicts),
            }
        }
    }

    #[async_trait]
    impl RoundRepository for ConflictingRepository {
        async fn append_round(
            &self,
            season: SeasonId,
            winning_number: f64,
            entries: &[ScoredEntry],
        ) -> Result<RoundNumber, RoundError> {
            let mut left = self.conflicts_left.lock().await;
            if *left > 0 {
                *left -= 1;
                return Err(RoundError::Conflict { season, round: 1 });
            }
            self.inner
                .append_round(season, winning_number, entries)
                .await
        }

        async fn list_rounds(&self, season: SeasonId) -> Result<Vec<RoundSummary>, RoundError> {
            self.inner.list_rounds(season).await
        }

        async fn get_round(
            &self,
            season: SeasonId,
            round: RoundNumber,
        ) -> Result<Option<Round>, RoundError> {
            self.inner.get_round(season, round).await
        }

        async fn season_rounds(&self, season: SeasonId) -> Result<Vec<Round>, RoundError> {
            self.inner.season_rounds(season).await
        }

        async fn list_seasons(&self) -> Result<Vec<SeasonId>, RoundError> {
            self.inner.list_seasons().await
        }

        async fn delete_last_round(&self, season: SeasonId) -> Result<DeletedRound, RoundError> {
            self.inner.delete_last_round(season).await
        }
    }

    #[tokio::test]
    async fn submit_round_scores_and_stores() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        let service = service(repo.clone());

        let round = service
            .submit_round_at(now(), 50.0, "Anna 45\nBen 55\nCara 50")
            .await
            .unwrap();

        assert_eq!(round.season_id, 1);
        assert_eq!(round.round_number, 1);
        assert_eq!(round.winner().unwrap().participant_name, "Cara");

        let stored = repo.get_round(1, 1).await.unwrap().unwrap();
        assert_eq!(stored, round);
    }

    #[tokio::test]
    async fn round_numbers_restart_each_season() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        let service = service(repo.clone());

        let first = service.submit_round_at(now(), 1.0, "A 1").await.unwrap();
        let second = service.submit_round_at(now(), 1.0, "A 2").await.unwrap();
        let next_season = service
            .submit_round_at(now() + Duration::weeks(12), 1.0, "A 3")
            .await
            .unwrap();

        assert_eq!((first.season_id, first.round_number), (1, 1));
        assert_eq!((second.season_id, second.round_number), (1, 2));
        assert_eq!((next_season.season_id, next_season.round_number), (2, 1));
    }

    #[tokio::test]
    async fn parse_errors_do_not_persist_anything() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        let service = service(repo.clone());

        let result = service.submit_round_at(now(), 50.0, "Anna 45\nBen").await;

        assert!(matches!(result, Err(RoundError::Parse(_))));
        assert_eq!(repo.round_count().await, 0);
    }

    #[tokio::test]
    async fn oversized_guess_is_reported_as_parse_error() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        let service = service(repo.clone());
        let guesses = format!("Anna 45\nBen {}", "9".repeat(400));

        let result = service.submit_round_at(now(), 50.0, &guesses).await;

        match result {
            Err(RoundError::Parse(error)) => assert_eq!(error.line, 2),
            other => panic!("expected a parse error, got {other:?}"),
        }
        assert_eq!(repo.round_count().await, 0);
    }

    #[tokio::test]
    async fn empty_guesses_are_invalid_input() {
        let repo = Arc::new(InMemoryRoundRepository::new());
        let service = service(repo.clone());

        let result = service.submit_round_at(now(), 50.0, "\n  \n").await;

        assert!(matches!(result, Err(RoundError::InvalidInput(_))));
        assert_eq!(repo.round_count().await, 0);
    }

    #[tokio::test]
    async fn submissions_before_epoch_are_rejected() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));
        let before = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let result = service.submit_round_at(before, 50.0, "Anna 45").await;
        assert!(matches!(result, Err(RoundError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn conflicts_are_retried() {
        let repo = Arc::new(ConflictingRepository::new(MAX_SUBMIT_ATTEMPTS - 1));
        let service = service(repo.clone());

        let round = service.submit_round_at(now(), 5.0, "Anna 4").await.unwrap();
        assert_eq!(round.round_number, 1);
    }

    #[tokio::test]
    async fn conflicts_surface_after_retries_are_exhausted() {
        let repo = Arc::new(ConflictingRepository::new(MAX_SUBMIT_ATTEMPTS));
        let service = service(repo.clone());

        let result = service.submit_round_at(now(), 5.0, "Anna 4").await;
        assert!(matches!(result, Err(RoundError::Conflict { .. })));
        assert!(repo.list_rounds(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_last_round_without_rounds_is_not_found() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));

        let result = service.delete_last_round_at(now()).await;
        assert!(matches!(result, Err(RoundError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_last_round_after_submission() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));
        let round = service
            .submit_round_at(now(), 50.0, "Anna 45\nBen 55")
            .await
            .unwrap();

        let deleted = service.delete_last_round_at(now()).await.unwrap();

        assert_eq!(deleted.round, round.round_number);
        assert_eq!(deleted.deleted_entries, 2);
        assert!(service.list_rounds(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_only_touches_current_season() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));
        service.submit_round_at(now(), 1.0, "A 1").await.unwrap();

        let later = now() + Duration::weeks(12);
        let result = service.delete_last_round_at(later).await;

        assert!(matches!(result, Err(RoundError::NotFound(_))));
        assert_eq!(service.list_rounds(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_round_reports_missing_rounds() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));

        let result = service.get_round(1, 7).await;
        assert!(matches!(result, Err(RoundError::NotFound(_))));
    }

    #[tokio::test]
    async fn standings_follow_deletions() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));
        service
            .submit_round_at(now(), 50.0, "Anna 45\nBen 55\nCara 50")
            .await
            .unwrap();
        service
            .submit_round_at(now(), 10.0, "Anna 10\nBen 30")
            .await
            .unwrap();

        let standings = service.standings(1).await.unwrap();
        assert_eq!(standings[0].participant_name, "Anna");
        assert_eq!(standings[0].total_points, 43);
        assert_eq!(standings[0].total_deviation, 5.0);

        service.delete_last_round_at(now()).await.unwrap();

        let standings = service.standings(1).await.unwrap();
        let names: Vec<&str> = standings
            .iter()
            .map(|s| s.participant_name.as_str())
            .collect();
        assert_eq!(names, vec!["Cara", "Anna", "Ben"]);
    }

    #[tokio::test]
    async fn participants_are_sorted_and_distinct() {
        let service = service(Arc::new(InMemoryRoundRepository::new()));
        service
            .submit_round_at(now(), 50.0, "Zoe 45\nAnna 55\nMax Mustermann 12,5%")
            .await
            .unwrap();
        service
            .submit_round_at(now(), 50.0, "Anna 50")
            .await
            .unwrap();

        assert_eq!(
            service.participants(1).await.unwrap(),
            vec!["Anna", "Max Mustermann", "Zoe"]
        );
    }
}
