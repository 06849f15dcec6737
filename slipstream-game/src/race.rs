//! Race resolution engine.
//!
//! Converts a field of entrants into a full classification: reliability rolls
//! at three checkpoints decide retirements, the pace model ranks the
//! survivors, and the configured points and purse tables price every slot.
//! Entrants are read-only here; the standings and economy phases apply the
//! outcome.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::config::GameConfig;
use crate::entities::{Car, CarId, Driver, DriverId, Event, RATING_MAX, TeamId, entrant_key};
use crate::error::ValidationError;
use crate::numbers::clamp_unit;
use crate::performance::{PaceSample, race_pace};
use crate::reliability::{failure_probability, per_checkpoint_probability};
use crate::rng::derive_stream_seed;

/// Race-day weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Dry,
    Wet,
}

/// Conditions an event is run under. Supplied by the caller and validated
/// before any simulation; the engine clamps only its own derived noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub weather: Weather,
    /// Harshness of the running conditions; zero is a mild day.
    pub severity: f64,
    /// Race distance relative to a standard-length event.
    pub distance_factor: f64,
    /// Era-wide reliability multiplier derived from the campaign year.
    pub era_reliability: f64,
}

impl Conditions {
    /// Reject malformed caller input before any rolls are made.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for negative severity, a non-positive
    /// distance factor, or a negative era multiplier.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.severity.is_finite() || self.severity < 0.0 {
            return Err(ValidationError::NegativeSeverity(self.severity));
        }
        if !self.distance_factor.is_finite() || self.distance_factor <= 0.0 {
            return Err(ValidationError::NonPositiveDistance(self.distance_factor));
        }
        if !self.era_reliability.is_finite() || self.era_reliability < 0.0 {
            return Err(ValidationError::NegativeEraReliability(self.era_reliability));
        }
        Ok(())
    }
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            weather: Weather::Dry,
            severity: 0.2,
            distance_factor: 1.0,
            era_reliability: 1.0,
        }
    }
}

/// Discrete points at which reliability is rolled during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    Opening,
    MidRace,
    FinalPush,
}

impl Checkpoint {
    pub const ALL: [Self; 3] = [Self::Opening, Self::MidRace, Self::FinalPush];

    /// How far through the race the entrant got before this checkpoint.
    #[must_use]
    pub const fn progress(self) -> u8 {
        match self {
            Self::Opening => 0,
            Self::MidRace => 1,
            Self::FinalPush => 2,
        }
    }
}

/// Why an entrant dropped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetirementReason {
    EngineFailure,
    Accident {
        /// Only ever true when fatal accidents are enabled in configuration.
        fatal: bool,
    },
}

/// Tagged outcome for one entrant; retirees are never disguised as finishers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Finished { pace: PaceSample },
    Retired {
        reason: RetirementReason,
        checkpoint: Checkpoint,
    },
}

impl Outcome {
    #[must_use]
    pub const fn is_finish(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// A (driver, car) pairing competing in one event. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct Entrant<'a> {
    pub driver: &'a Driver,
    pub car: &'a Car,
}

impl Entrant<'_> {
    #[must_use]
    pub fn key(&self) -> u64 {
        entrant_key(self.driver.id, self.car.id)
    }
}

/// One classified slot of a race result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntrant {
    /// 1-based finishing position; retirees fill the tail positions.
    pub position: u16,
    pub driver: DriverId,
    pub team: TeamId,
    pub car: CarId,
    pub outcome: Outcome,
    pub points: u32,
    /// Organiser prize in minor units, before the constructor share cut.
    pub prize: i64,
}

/// Classification buffer; typical grids fit inline.
pub type Classification = SmallVec<[ClassifiedEntrant; 8]>;

/// Immutable outcome of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    /// Stable identity for idempotence guards downstream.
    pub identity: u64,
    pub year: u32,
    pub week: u32,
    pub event_name: String,
    pub prestige: f64,
    pub conditions: Conditions,
    pub classification: Classification,
}

impl RaceResult {
    /// Entrants that reached the flag, in classified order.
    pub fn finishers(&self) -> impl Iterator<Item = &ClassifiedEntrant> {
        self.classification.iter().filter(|c| c.outcome.is_finish())
    }

    /// Entrants that dropped out, in classified order.
    pub fn retirements(&self) -> impl Iterator<Item = &ClassifiedEntrant> {
        self.classification
            .iter()
            .filter(|c| !c.outcome.is_finish())
    }
}

struct RolledEntrant<'a> {
    entrant: Entrant<'a>,
    key: u64,
    outcome: Outcome,
}

/// Resolve one race.
///
/// Deterministic for identical entrants, event, conditions, and seed: the
/// seed feeds two domain-separated streams (reliability and pace), ties are
/// broken by pace, then driver consistency, then the stable entrant key, and
/// retirees are ranked by how far they got before failing. An empty entrant
/// list yields an empty classification, not an error.
///
/// # Errors
///
/// Returns `ValidationError` when the conditions are malformed; no rolls are
/// made in that case.
pub fn resolve_race(
    entrants: &[Entrant<'_>],
    event: &Event,
    year: u32,
    conditions: Conditions,
    cfg: &GameConfig,
    seed: u64,
) -> Result<RaceResult, ValidationError> {
    conditions.validate()?;

    let mut reliability_rng =
        ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, b"reliability"));
    let mut pace_rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, b"pace"));

    let mut rolled: Vec<RolledEntrant<'_>> = Vec::with_capacity(entrants.len());
    for entrant in entrants {
        let outcome = roll_outcome(entrant, &conditions, cfg, &mut reliability_rng, &mut pace_rng);
        rolled.push(RolledEntrant {
            entrant: *entrant,
            key: entrant.key(),
            outcome,
        });
    }

    let (mut finishers, mut retirees): (Vec<_>, Vec<_>) =
        rolled.into_iter().partition(|r| r.outcome.is_finish());

    finishers.sort_by(|a, b| {
        let pace_a = match a.outcome {
            Outcome::Finished { pace } => pace.resolved(),
            Outcome::Retired { .. } => 0.0,
        };
        let pace_b = match b.outcome {
            Outcome::Finished { pace } => pace.resolved(),
            Outcome::Retired { .. } => 0.0,
        };
        pace_b
            .total_cmp(&pace_a)
            .then_with(|| {
                b.entrant
                    .driver
                    .skills
                    .consistency
                    .cmp(&a.entrant.driver.skills.consistency)
            })
            .then_with(|| a.key.cmp(&b.key))
    });

    // Later failure outranks earlier failure.
    retirees.sort_by(|a, b| {
        let progress_a = retirement_progress(&a.outcome);
        let progress_b = retirement_progress(&b.outcome);
        progress_b
            .cmp(&progress_a)
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut classification = Classification::new();
    let mut position: u16 = 0;
    for roll in finishers.into_iter().chain(retirees) {
        position += 1;
        let finished = roll.outcome.is_finish();
        let points = if finished { cfg.points.award(position) } else { 0 };
        let prize = cfg.purse.prize_for(position, finished, event.prestige);
        classification.push(ClassifiedEntrant {
            position,
            driver: roll.entrant.driver.id,
            team: roll.entrant.car.team,
            car: roll.entrant.car.id,
            outcome: roll.outcome,
            points,
            prize,
        });
    }

    let identity = result_identity(year, event.week, seed, &classification);
    log::debug!(
        "resolved {}: {} classified, {} retirements",
        event.name,
        classification.len(),
        classification.iter().filter(|c| !c.outcome.is_finish()).count(),
    );

    Ok(RaceResult {
        identity,
        year,
        week: event.week,
        event_name: event.name.clone(),
        prestige: event.prestige,
        conditions,
        classification,
    })
}

fn roll_outcome<R: Rng>(
    entrant: &Entrant<'_>,
    conditions: &Conditions,
    cfg: &GameConfig,
    reliability_rng: &mut R,
    pace_rng: &mut R,
) -> Outcome {
    let checkpoints = u32::try_from(Checkpoint::ALL.len()).unwrap_or(3);
    let failure = failure_probability(entrant.car, conditions, &cfg.reliability);
    let engine_q = per_checkpoint_probability(failure, checkpoints);
    let crash_q = per_checkpoint_probability(crash_probability(entrant.driver, conditions, cfg), checkpoints);

    for checkpoint in Checkpoint::ALL {
        if reliability_rng.r#gen::<f64>() < engine_q {
            return Outcome::Retired {
                reason: RetirementReason::EngineFailure,
                checkpoint,
            };
        }
        if reliability_rng.r#gen::<f64>() < crash_q {
            let fatal = cfg.crash.fatal_enabled
                && conditions.severity >= cfg.crash.fatal_severity_threshold
                && reliability_rng.r#gen::<f64>() < cfg.crash.fatal_chance;
            return Outcome::Retired {
                reason: RetirementReason::Accident { fatal },
                checkpoint,
            };
        }
    }

    let pace = race_pace(entrant.car, entrant.driver, conditions, &cfg.pace, pace_rng);
    Outcome::Finished { pace }
}

fn crash_probability(driver: &Driver, conditions: &Conditions, cfg: &GameConfig) -> f64 {
    let consistency_deficit =
        1.0 - f64::from(driver.skills.consistency.min(RATING_MAX)) / f64::from(RATING_MAX);
    let base = cfg
        .crash
        .consistency_coeff
        .mul_add(consistency_deficit, cfg.crash.base);
    clamp_unit(base * cfg.crash.severity_coeff.mul_add(conditions.severity, 1.0))
}

const fn retirement_progress(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Retired { checkpoint, .. } => checkpoint.progress(),
        Outcome::Finished { .. } => u8::MAX,
    }
}

fn result_identity(year: u32, week: u32, seed: u64, classification: &Classification) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write_u32(year);
    hasher.write_u32(week);
    hasher.write_u64(seed);
    for entry in classification {
        hasher.write_u32(entry.driver.0);
        hasher.write_u32(entry.car.0);
        hasher.write_u16(entry.position);
    }
    hasher.finish()
}
