use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    errors::RoundError,
    models::{DeletedRound, Round, RoundNumber, RoundSummary, ScoredEntry},
};
use crate::season::SeasonId;

/// Durable, append-only log of scored rounds keyed by `(season, round number)`
#[async_trait]
pub trait RoundRepository: Send + Sync {
    /// Stores a scored round under the next free round number of `season`.
    ///
    /// Number assignment and insert are atomic; a lost race surfaces as
    /// `RoundError::Conflict` so the caller can retry.
    async fn append_round(
        &self,
        season: SeasonId,
        winning_number: f64,
        entries: &[ScoredEntry],
    ) -> Result<RoundNumber, RoundError>;

    /// Round headers of `season`, newest first
    async fn list_rounds(&self, season: SeasonId) -> Result<Vec<RoundSummary>, RoundError>;

    async fn get_round(
        &self,
        season: SeasonId,
        round: RoundNumber,
    ) -> Result<Option<Round>, RoundError>;

    /// Every round of `season` with its entries, oldest first
    async fn season_rounds(&self, season: SeasonId) -> Result<Vec<Round>, RoundError>;

    /// Distinct seasons that have at least one stored round, newest first
    async fn list_seasons(&self) -> Result<Vec<SeasonId>, RoundError>;

    /// Removes the highest numbered round of `season` with all its entries
    async fn delete_last_round(&self, season: SeasonId) -> Result<DeletedRound, RoundError>;
}

fn no_rounds(season: SeasonId) -> RoundError {
    RoundError::NotFound(format!("No rounds to delete in season {season}"))
}

/// In-memory implementation of RoundRepository for development and testing
#[derive(Debug, Default)]
pub struct InMemoryRoundRepository {
    rounds: RwLock<BTreeMap<(SeasonId, RoundNumber), Round>>,
}

impl InMemoryRoundRepository {
    pub fn new() -> Self {
        Self {
            rounds: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a repository pre-populated with rounds
    pub fn with_rounds(rounds: Vec<Round>) -> Self {
        let rounds = rounds
            .into_iter()
            .map(|round| ((round.season_id, round.round_number), round))
            .collect();

        Self {
            rounds: RwLock::new(rounds),
        }
    }

    pub async fn round_count(&self) -> usize {
        self.rounds.read().await.len()
    }
}

fn season_range(
    rounds: &BTreeMap<(SeasonId, RoundNumber), Round>,
    season: SeasonId,
) -> impl DoubleEndedIterator<Item = &Round> {
    rounds
        .range((season, RoundNumber::MIN)..=(season, RoundNumber::MAX))
        .map(|(_, round)| round)
}

#[async_trait]
impl RoundRepository for InMemoryRoundRepository {
    #[instrument(skip(self, entries))]
    async fn append_round(
        &self,
        season: SeasonId,
        winning_number: f64,
        entries: &[ScoredEntry],
    ) -> Result<RoundNumber, RoundError> {
        let mut rounds = self.rounds.write().await;

        let round_number = season_range(&rounds, season)
            .next_back()
            .map(|round| round.round_number + 1)
            .unwrap_or(1);

        debug!(season, round_number, entry_count = entries.len(), "Appending round in memory");

        rounds.insert(
            (season, round_number),
            Round {
                season_id: season,
                round_number,
                winning_number,
                entries: entries.to_vec(),
            },
        );

        Ok(round_number)
    }

    #[instrument(skip(self))]
    async fn list_rounds(&self, season: SeasonId) -> Result<Vec<RoundSummary>, RoundError> {
        let rounds = self.rounds.read().await;
        Ok(season_range(&rounds, season)
            .rev()
            .map(|round| RoundSummary {
                round: round.round_number,
                winning_number: round.winning_number,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_round(
        &self,
        season: SeasonId,
        round: RoundNumber,
    ) -> Result<Option<Round>, RoundError> {
        let rounds = self.rounds.read().await;
        let found = rounds.get(&(season, round)).cloned();

        if found.is_none() {
            debug!(season, round, "Round not found in memory");
        }

        Ok(found)
    }

    #[instrument(skip(self))]
    async fn season_rounds(&self, season: SeasonId) -> Result<Vec<Round>, RoundError> {
        let rounds = self.rounds.read().await;
        Ok(season_range(&rounds, season).cloned().collect())
    }

    #[instrument(skip(self))]
    async fn list_seasons(&self) -> Result<Vec<SeasonId>, RoundError> {
        let rounds = self.rounds.read().await;
        let mut seasons: Vec<SeasonId> = rounds.keys().map(|(season, _)| *season).collect();
        seasons.dedup();
        seasons.reverse();
        Ok(seasons)
    }

    #[instrument(skip(self))]
    async fn delete_last_round(&self, season: SeasonId) -> Result<DeletedRound, RoundError> {
        let mut rounds = self.rounds.write().await;

        let last = season_range(&rounds, season)
            .next_back()
            .map(|round| round.round_number)
            .ok_or_else(|| no_rounds(season))?;

        let removed = rounds.remove(&(season, last)).ok_or_else(|| no_rounds(season))?;

        debug!(season, round = last, "Deleted last round from memory");

        Ok(DeletedRound {
            season,
            round: last,
            deleted_entries: removed.entries.len() as u64,
        })
    }
}

/// PostgreSQL implementation of round repository
pub struct PostgresRoundRepository {
    pool: PgPool,
}

fn store_error(e: sqlx::Error) -> RoundError {
    warn!(error = %e, "Round store query failed");
    RoundError::StoreUnavailable(e.to_string())
}

fn to_db(value: u32) -> Result<i32, RoundError> {
    i32::try_from(value).map_err(|_| RoundError::InvalidInput(format!("{value} is out of range")))
}

fn from_db(value: i32) -> Result<u32, RoundError> {
    u32::try_from(value)
        .map_err(|_| RoundError::StoreUnavailable(format!("Stored value {value} is negative")))
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> Result<ScoredEntry, RoundError> {
    Ok(ScoredEntry {
        participant_name: row.try_get("participant_name").map_err(store_error)?,
        value: row.try_get("guess").map_err(store_error)?,
        deviation: row.try_get("deviation").map_err(store_error)?,
        rank: from_db(row.try_get("rank").map_err(store_error)?)?,
        points: from_db(row.try_get("points").map_err(store_error)?)?,
    })
}

impl PostgresRoundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the round tables if they do not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), RoundError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rounds (
                season_id INTEGER NOT NULL,
                round_number INTEGER NOT NULL,
                winning_number DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (season_id, round_number)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS round_entries (
                season_id INTEGER NOT NULL,
                round_number INTEGER NOT NULL,
                position INTEGER NOT NULL,
                participant_name TEXT NOT NULL,
                guess DOUBLE PRECISION NOT NULL,
                deviation DOUBLE PRECISION NOT NULL,
                rank INTEGER NOT NULL,
                points INTEGER NOT NULL,
                PRIMARY KEY (season_id, round_number, position),
                FOREIGN KEY (season_id, round_number)
                    REFERENCES rounds (season_id, round_number) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        debug!("Round schema ready");
        Ok(())
    }

    async fn insert_entries(
        tx: &mut Transaction<'_, Postgres>,
        season: i32,
        round: i32,
        entries: &[ScoredEntry],
    ) -> Result<(), RoundError> {
        for (position, entry) in entries.iter().enumerate() {
            sqlx::query(
                "INSERT INTO round_entries (season_id, round_number, position, participant_name, guess, deviation, rank, points) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            )
            .bind(season)
            .bind(round)
            .bind(to_db(position as u32)?)
            .bind(&entry.participant_name)
            .bind(entry.value)
            .bind(entry.deviation)
            .bind(to_db(entry.rank)?)
            .bind(to_db(entry.points)?)
            .execute(&mut **tx)
            .await
            .map_err(store_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RoundRepository for PostgresRoundRepository {
    #[instrument(skip(self, entries))]
    async fn append_round(
        &self,
        season: SeasonId,
        winning_number: f64,
        entries: &[ScoredEntry],
    ) -> Result<RoundNumber, RoundError> {
        let season_db = to_db(season)?;
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(round_number), 0) + 1 FROM rounds WHERE season_id = $1",
        )
        .bind(season_db)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        let inserted = sqlx::query(
            "INSERT INTO rounds (season_id, round_number, winning_number, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(season_db)
        .bind(next)
        .bind(winning_number)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            let round = from_db(next)?;
            return match e.as_database_error() {
                Some(db_error) if db_error.is_unique_violation() => {
                    warn!(season, round, "Round number taken by concurrent submission");
                    Err(RoundError::Conflict { season, round })
                }
                _ => Err(store_error(e)),
            };
        }

        Self::insert_entries(&mut tx, season_db, next, entries).await?;
        tx.commit().await.map_err(store_error)?;

        debug!(season, round_number = next, entry_count = entries.len(), "Round stored in database");
        from_db(next)
    }

    #[instrument(skip(self))]
    async fn list_rounds(&self, season: SeasonId) -> Result<Vec<RoundSummary>, RoundError> {
        let rows = sqlx::query(
            "SELECT round_number, winning_number FROM rounds WHERE season_id = $1 ORDER BY round_number DESC",
        )
        .bind(to_db(season)?)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.iter()
            .map(|row| -> Result<RoundSummary, RoundError> {
                Ok(RoundSummary {
                    round: from_db(row.try_get("round_number").map_err(store_error)?)?,
                    winning_number: row.try_get("winning_number").map_err(store_error)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn get_round(
        &self,
        season: SeasonId,
        round: RoundNumber,
    ) -> Result<Option<Round>, RoundError> {
        let winning_number: Option<f64> = sqlx::query_scalar(
            "SELECT winning_number FROM rounds WHERE season_id = $1 AND round_number = $2",
        )
        .bind(to_db(season)?)
        .bind(to_db(round)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        let Some(winning_number) = winning_number else {
            debug!(season, round, "Round not found in database");
            return Ok(None);
        };

        let rows = sqlx::query(
            "SELECT participant_name, guess, deviation, rank, points FROM round_entries WHERE season_id = $1 AND round_number = $2 ORDER BY position",
        )
        .bind(to_db(season)?)
        .bind(to_db(round)?)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let entries = rows.iter().map(entry_from_row).collect::<Result<_, _>>()?;

        Ok(Some(Round {
            season_id: season,
            round_number: round,
            winning_number,
            entries,
        }))
    }

    #[instrument(skip(self))]
    async fn season_rounds(&self, season: SeasonId) -> Result<Vec<Round>, RoundError> {
        let season_db = to_db(season)?;

        // Headers and entries must come from the same snapshot
        let mut tx = self.pool.begin().await.map_err(store_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        let headers = sqlx::query(
            "SELECT round_number, winning_number FROM rounds WHERE season_id = $1 ORDER BY round_number",
        )
        .bind(season_db)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        let rows = sqlx::query(
            "SELECT round_number, participant_name, guess, deviation, rank, points FROM round_entries WHERE season_id = $1 ORDER BY round_number, position",
        )
        .bind(season_db)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        let mut rounds = headers
            .iter()
            .map(|row| -> Result<Round, RoundError> {
                Ok(Round {
                    season_id: season,
                    round_number: from_db(row.try_get("round_number").map_err(store_error)?)?,
                    winning_number: row.try_get("winning_number").map_err(store_error)?,
                    entries: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for row in &rows {
            let round_number = from_db(row.try_get("round_number").map_err(store_error)?)?;
            let entry = entry_from_row(row)?;
            match rounds.binary_search_by_key(&round_number, |r| r.round_number) {
                Ok(index) => rounds[index].entries.push(entry),
                Err(_) => {
                    warn!(season, round_number, "Entry without round header");
                    return Err(RoundError::StoreUnavailable(format!(
                        "Entries of season {season} round {round_number} have no round header"
                    )));
                }
            }
        }

        Ok(rounds)
    }

    #[instrument(skip(self))]
    async fn list_seasons(&self) -> Result<Vec<SeasonId>, RoundError> {
        let seasons: Vec<i32> =
            sqlx::query_scalar("SELECT DISTINCT season_id FROM rounds ORDER BY season_id DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;

        seasons.into_iter().map(from_db).collect()
    }

    #[instrument(skip(self))]
    async fn delete_last_round(&self, season: SeasonId) -> Result<DeletedRound, RoundError> {
        let season_db = to_db(season)?;
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let last: Option<i32> = sqlx::query_scalar(
            "SELECT round_number FROM rounds WHERE season_id = $1 ORDER BY round_number DESC LIMIT 1 FOR UPDATE",
        )
        .bind(season_db)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let Some(last) = last else {
            warn!(season, "No rounds to delete");
            return Err(no_rounds(season));
        };

        let deleted = sqlx::query("DELETE FROM round_entries WHERE season_id = $1 AND round_number = $2")
            .bind(season_db)
            .bind(last)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        sqlx::query("DELETE FROM rounds WHERE season_id = $1 AND round_number = $2")
            .bind(season_db)
            .bind(last)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(DeletedRound {
            season,
            round: from_db(last)?,
            deleted_entries: deleted.rows_affected(),
        })
    }
}
