//! Error taxonomy for the season engine.
//!
//! `ValidationError` covers malformed caller input and is always raised before
//! any state mutation, so the caller can correct and retry. `InsolvencyCondition`
//! is a report, not a failure; it travels inside [`crate::economy::SolvencyStatus`].
//! `InvariantViolation` marks internal bookkeeping defects and is surfaced
//! loudly instead of being clamped away.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed caller input, rejected before any state changes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("condition severity must be non-negative, got {0}")]
    NegativeSeverity(f64),
    #[error("distance factor must be positive, got {0}")]
    NonPositiveDistance(f64),
    #[error("era reliability multiplier must be non-negative, got {0}")]
    NegativeEraReliability(f64),
    #[error("upgrade spend must be positive, got {0}")]
    NonPositiveSpend(i64),
    #[error("maintenance spend must be positive, got {0}")]
    NonPositiveMaintenance(i64),
    #[error("spend of {0} minor units buys no upgrade step")]
    SpendBelowStep(i64),
    #[error("wage must be positive, got {0}")]
    NonPositiveWage(i64),
    #[error("contract duration must be at least one season")]
    ZeroContractDuration,
    #[error("unknown driver '{0}'")]
    UnknownDriver(String),
    #[error("unknown team '{0}'")]
    UnknownTeam(String),
    #[error("unknown car '{0}'")]
    UnknownCar(String),
    #[error("car '{0}' is not owned by the team")]
    CarNotOwned(String),
    #[error("team has no race-worthy car")]
    NoCarAvailable,
    #[error("unknown sponsor offer '{0}'")]
    UnknownSponsorOffer(String),
    #[error("unknown event in week {0}")]
    UnknownEvent(u32),
    #[error("driver '{0}' is already under contract")]
    DriverAlreadyContracted(String),
    #[error("driver '{0}' is not on the team roster")]
    DriverNotOnRoster(String),
    #[error("driver '{0}' is no longer active")]
    DriverInactive(String),
    #[error("roster is full ({0} seats)")]
    RosterFull(usize),
    #[error("no driver available to enter the race")]
    EmptyRoster,
    #[error("sponsor '{0}' is already signed")]
    SponsorAlreadySigned(String),
    #[error("insufficient funds: need {needed} minor units, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("result {0:#018x} was already applied to the standings")]
    ResultAlreadyApplied(u64),
    #[error("result belongs to season {result_year}, standings track season {standings_year}")]
    ResultSeasonMismatch { result_year: u32, standings_year: u32 },
    #[error("no race is scheduled for week {0}")]
    NoRaceThisWeek(u32),
    #[error("season has {0} events still to run")]
    SeasonIncomplete(u32),
}

/// Report payload for a treasury balance breaching the configured floor.
///
/// Emitted at most once per settlement; the engine never escalates this to a
/// failure. Forced sales or dissolution are caller policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsolvencyCondition {
    /// Balance after the settlement committed, in minor units.
    pub balance: i64,
    /// Configured solvency floor in minor units.
    pub floor: i64,
    /// How far below the floor the balance sits.
    pub shortfall: i64,
}

/// Internal inconsistency. Fatal by design: callers must never see one of
/// these from correct engine code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated: {0}")]
pub struct InvariantViolation(pub String);

impl InvariantViolation {
    /// Log and abort on an internal bookkeeping defect.
    #[track_caller]
    pub(crate) fn raise(detail: impl Into<String>) -> ! {
        let violation = Self(detail.into());
        log::error!("{violation}");
        panic!("{violation}");
    }
}
