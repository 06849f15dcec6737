//! Tuning tables supplied at initialization.
//!
//! The engine treats every table here as opaque parameters: points, purses,
//! failure and crash curves, the age curve, economy rates, and the calendar
//! shape all arrive from configuration and are validated up front. Caller
//! mistakes are rejected with [`ConfigError`]; the engine never silently
//! repairs a bad table.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::entities::SponsorTerms;
use crate::numbers::round_f64_to_i64;
use crate::race::Weather;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must not be empty")]
    EmptyTable { field: &'static str },
    #[error("{field} entries must be sorted ascending")]
    Unsorted { field: &'static str },
    #[error("calendar window invalid for '{event}' (start {start} > end {end})")]
    CalendarWindow {
        event: String,
        start: u32,
        end: u32,
    },
    #[error("calendar week {week} for '{event}' exceeds season length {weeks}")]
    CalendarWeekOutOfSeason {
        event: String,
        week: u32,
        weeks: u32,
    },
}

/// Championship points by finishing position (index 0 = winner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointsTable(pub Vec<u32>);

impl PointsTable {
    /// Points for a 1-based finishing position; beyond-table positions score zero.
    #[must_use]
    pub fn award(&self, position: u16) -> u32 {
        if position == 0 {
            return 0;
        }
        self.0.get(usize::from(position) - 1).copied().unwrap_or(0)
    }

    /// Largest total the table can pay out to a field of the given size.
    #[must_use]
    pub fn max_total(&self, field_size: usize) -> u64 {
        self.0
            .iter()
            .take(field_size)
            .map(|&p| u64::from(p))
            .sum()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            return Err(ConfigError::EmptyTable { field: "points" });
        }
        Ok(())
    }
}

impl Default for PointsTable {
    fn default() -> Self {
        Self(vec![8, 6, 4, 3, 2, 1])
    }
}

/// Prize purse rules; every amount is minor currency units at prestige 1.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurseConfig {
    /// Organiser prize for the top finishing positions (index 0 = winner).
    #[serde(default = "PurseConfig::default_podium")]
    pub podium: Vec<i64>,
    /// Flat payment for classified finishers beyond the podium table.
    #[serde(default)]
    pub finisher_bonus: i64,
}

impl PurseConfig {
    fn default_podium() -> Vec<i64> {
        vec![30_000, 20_000, 10_000]
    }

    /// Prize for a 1-based position, scaled by the event prestige weight.
    /// Retirees earn nothing from the purse.
    #[must_use]
    pub fn prize_for(&self, position: u16, finished: bool, prestige: f64) -> i64 {
        if !finished || position == 0 {
            return 0;
        }
        let base = self
            .podium
            .get(usize::from(position) - 1)
            .copied()
            .unwrap_or(self.finisher_bonus);
        round_f64_to_i64(crate::numbers::i64_to_f64(base) * prestige.max(0.0))
    }

    /// Largest total payable to a fully classified field at this prestige.
    #[must_use]
    pub fn max_total(&self, field_size: usize, prestige: f64) -> i64 {
        (1..=field_size)
            .map(|pos| self.prize_for(pos as u16, true, prestige))
            .sum()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.podium.is_empty() {
            return Err(ConfigError::EmptyTable {
                field: "purse.podium",
            });
        }
        for &prize in &self.podium {
            if prize < 0 {
                return Err(ConfigError::MinViolation {
                    field: "purse.podium",
                    min: 0.0,
                    value: crate::numbers::i64_to_f64(prize),
                });
            }
        }
        if self.finisher_bonus < 0 {
            return Err(ConfigError::MinViolation {
                field: "purse.finisher_bonus",
                min: 0.0,
                value: crate::numbers::i64_to_f64(self.finisher_bonus),
            });
        }
        Ok(())
    }
}

impl Default for PurseConfig {
    fn default() -> Self {
        Self {
            podium: Self::default_podium(),
            finisher_bonus: 0,
        }
    }
}

/// Mechanical failure probability curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureCurve {
    /// Floor probability for a pristine, fully reliable car.
    #[serde(default = "FailureCurve::default_base")]
    pub base: f64,
    /// Weight of the reliability-rating deficit (1 - rating/100).
    #[serde(default = "FailureCurve::default_rating_coeff")]
    pub rating_coeff: f64,
    /// Weight of accumulated wear (wear/100, uncapped input tolerated).
    #[serde(default = "FailureCurve::default_wear_coeff")]
    pub wear_coeff: f64,
    /// Scaling of condition severity on top of the mechanical terms.
    #[serde(default = "FailureCurve::default_severity_coeff")]
    pub severity_coeff: f64,
}

impl FailureCurve {
    const fn default_base() -> f64 {
        0.01
    }

    const fn default_rating_coeff() -> f64 {
        0.20
    }

    const fn default_wear_coeff() -> f64 {
        0.25
    }

    const fn default_severity_coeff() -> f64 {
        0.50
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.base) {
            return Err(ConfigError::RangeViolation {
                field: "reliability.base",
                min: 0.0,
                max: 1.0,
                value: self.base,
            });
        }
        for (field, value) in [
            ("reliability.rating_coeff", self.rating_coeff),
            ("reliability.wear_coeff", self.wear_coeff),
            ("reliability.severity_coeff", self.severity_coeff),
        ] {
            if value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for FailureCurve {
    fn default() -> Self {
        Self {
            base: Self::default_base(),
            rating_coeff: Self::default_rating_coeff(),
            wear_coeff: Self::default_wear_coeff(),
            severity_coeff: Self::default_severity_coeff(),
        }
    }
}

/// Weighting of car components when composing raw pace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceWeights {
    pub engine: f64,
    pub grip: f64,
}

/// Pace model tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceModelConfig {
    /// Component weights per weather; wet conditions weight grip higher.
    #[serde(default = "PaceModelConfig::default_weights")]
    pub weights: HashMap<Weather, PaceWeights>,
    /// Strength of the driver skill modifier around the neutral 50 rating.
    #[serde(default = "PaceModelConfig::default_driver_influence")]
    pub driver_influence: f64,
    /// Lower bound on the multiplicative driver factor; keeps pace positive.
    #[serde(default = "PaceModelConfig::default_driver_floor")]
    pub driver_floor: f64,
    /// Upper bound on the multiplicative driver factor.
    #[serde(default = "PaceModelConfig::default_driver_ceiling")]
    pub driver_ceiling: f64,
    /// Race-day variance amplitude relative to expected pace.
    #[serde(default = "PaceModelConfig::default_noise_scale")]
    pub noise_scale: f64,
}

impl PaceModelConfig {
    fn default_weights() -> HashMap<Weather, PaceWeights> {
        HashMap::from([
            (
                Weather::Dry,
                PaceWeights {
                    engine: 0.6,
                    grip: 0.4,
                },
            ),
            (
                Weather::Wet,
                PaceWeights {
                    engine: 0.4,
                    grip: 0.6,
                },
            ),
        ])
    }

    const fn default_driver_influence() -> f64 {
        0.35
    }

    const fn default_driver_floor() -> f64 {
        0.60
    }

    const fn default_driver_ceiling() -> f64 {
        1.40
    }

    const fn default_noise_scale() -> f64 {
        0.25
    }

    /// Component weights for the given weather, falling back to dry weights.
    #[must_use]
    pub fn weights_for(&self, weather: Weather) -> PaceWeights {
        self.weights
            .get(&weather)
            .or_else(|| self.weights.get(&Weather::Dry))
            .copied()
            .unwrap_or(PaceWeights {
                engine: 0.6,
                grip: 0.4,
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for weights in self.weights.values() {
            for (field, value) in [("pace.weights.engine", weights.engine), (
                "pace.weights.grip",
                weights.grip,
            )] {
                if value < 0.0 {
                    return Err(ConfigError::MinViolation {
                        field,
                        min: 0.0,
                        value,
                    });
                }
            }
        }
        if self.driver_floor <= 0.0 {
            return Err(ConfigError::MinViolation {
                field: "pace.driver_floor",
                min: f64::EPSILON,
                value: self.driver_floor,
            });
        }
        if self.driver_ceiling < self.driver_floor {
            return Err(ConfigError::RangeViolation {
                field: "pace.driver_ceiling",
                min: self.driver_floor,
                max: f64::MAX,
                value: self.driver_ceiling,
            });
        }
        if !(0.0..=1.0).contains(&self.noise_scale) {
            return Err(ConfigError::RangeViolation {
                field: "pace.noise_scale",
                min: 0.0,
                max: 1.0,
                value: self.noise_scale,
            });
        }
        if self.driver_influence < 0.0 {
            return Err(ConfigError::MinViolation {
                field: "pace.driver_influence",
                min: 0.0,
                value: self.driver_influence,
            });
        }
        Ok(())
    }
}

impl Default for PaceModelConfig {
    fn default() -> Self {
        Self {
            weights: Self::default_weights(),
            driver_influence: Self::default_driver_influence(),
            driver_floor: Self::default_driver_floor(),
            driver_ceiling: Self::default_driver_ceiling(),
            noise_scale: Self::default_noise_scale(),
        }
    }
}

/// Driver-error crash curve, including the config-gated fatal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashConfig {
    #[serde(default = "CrashConfig::default_base")]
    pub base: f64,
    /// Weight of the consistency deficit (1 - consistency/100).
    #[serde(default = "CrashConfig::default_consistency_coeff")]
    pub consistency_coeff: f64,
    /// Scaling of condition severity on the crash chance.
    #[serde(default = "CrashConfig::default_severity_coeff")]
    pub severity_coeff: f64,
    /// Fatal accidents are opt-in; off, every crash is a retirement only.
    #[serde(default)]
    pub fatal_enabled: bool,
    /// Severity at or above which a crash may turn fatal.
    #[serde(default = "CrashConfig::default_fatal_severity_threshold")]
    pub fatal_severity_threshold: f64,
    /// Probability that a qualifying crash is fatal.
    #[serde(default = "CrashConfig::default_fatal_chance")]
    pub fatal_chance: f64,
}

impl CrashConfig {
    const fn default_base() -> f64 {
        0.006
    }

    const fn default_consistency_coeff() -> f64 {
        0.12
    }

    const fn default_severity_coeff() -> f64 {
        0.60
    }

    const fn default_fatal_severity_threshold() -> f64 {
        1.5
    }

    const fn default_fatal_chance() -> f64 {
        0.02
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("crash.base", self.base),
            ("crash.consistency_coeff", self.consistency_coeff),
            ("crash.severity_coeff", self.severity_coeff),
            ("crash.fatal_severity_threshold", self.fatal_severity_threshold),
        ] {
            if value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.fatal_chance) {
            return Err(ConfigError::RangeViolation {
                field: "crash.fatal_chance",
                min: 0.0,
                max: 1.0,
                value: self.fatal_chance,
            });
        }
        Ok(())
    }
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            base: Self::default_base(),
            consistency_coeff: Self::default_consistency_coeff(),
            severity_coeff: Self::default_severity_coeff(),
            fatal_enabled: false,
            fatal_severity_threshold: Self::default_fatal_severity_threshold(),
            fatal_chance: Self::default_fatal_chance(),
        }
    }
}

/// One band of the tabulated age curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub from_age: u32,
    /// Per-season skill drift applied to every attribute while in the band.
    pub drift: i8,
}

/// Tabulated age-skill curve plus the retirement threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeCurve {
    #[serde(default = "AgeCurve::default_bands")]
    pub bands: Vec<AgeBand>,
    #[serde(default = "AgeCurve::default_retirement_age")]
    pub retirement_age: u32,
}

impl AgeCurve {
    fn default_bands() -> Vec<AgeBand> {
        vec![
            AgeBand {
                from_age: 17,
                drift: 2,
            },
            AgeBand {
                from_age: 24,
                drift: 1,
            },
            AgeBand {
                from_age: 28,
                drift: 0,
            },
            AgeBand {
                from_age: 32,
                drift: -1,
            },
            AgeBand {
                from_age: 35,
                drift: -2,
            },
            AgeBand {
                from_age: 39,
                drift: -3,
            },
        ]
    }

    const fn default_retirement_age() -> u32 {
        40
    }

    /// Drift for the band the age falls into; ages below the first band
    /// use the first band's drift.
    #[must_use]
    pub fn drift_for(&self, age: u32) -> i8 {
        self.bands
            .iter()
            .take_while(|band| band.from_age <= age)
            .last()
            .or_else(|| self.bands.first())
            .map_or(0, |band| band.drift)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.is_empty() {
            return Err(ConfigError::EmptyTable {
                field: "age_curve.bands",
            });
        }
        if !self.bands.windows(2).all(|w| w[0].from_age < w[1].from_age) {
            return Err(ConfigError::Unsorted {
                field: "age_curve.bands",
            });
        }
        if self.retirement_age == 0 {
            return Err(ConfigError::MinViolation {
                field: "age_curve.retirement_age",
                min: 1.0,
                value: 0.0,
            });
        }
        Ok(())
    }
}

impl Default for AgeCurve {
    fn default() -> Self {
        Self {
            bands: Self::default_bands(),
            retirement_age: Self::default_retirement_age(),
        }
    }
}

/// How car wear carries into the next season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WearCarryover {
    /// Keep accumulated wear as-is.
    Full,
    /// Off-season rebuilds halve the accumulated wear.
    #[default]
    Halved,
    /// Cars start the season fresh.
    Reset,
}

/// One band of the reputation swing table (positions up to `up_to` inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationBand {
    pub up_to: u16,
    pub delta: f64,
}

/// Reputation movement from race results, scaled by event prestige.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationConfig {
    #[serde(default = "ReputationConfig::default_bands")]
    pub position_bands: Vec<ReputationBand>,
    #[serde(default = "ReputationConfig::default_dnf_delta")]
    pub dnf_delta: f64,
    /// End-of-season adjustment per championship rank (index 0 = champion).
    #[serde(default = "ReputationConfig::default_season_rank_bonus")]
    pub season_rank_bonus: Vec<f64>,
}

impl ReputationConfig {
    fn default_bands() -> Vec<ReputationBand> {
        vec![
            ReputationBand { up_to: 1, delta: 3.0 },
            ReputationBand { up_to: 2, delta: 2.0 },
            ReputationBand { up_to: 3, delta: 1.5 },
            ReputationBand { up_to: 5, delta: 1.0 },
            ReputationBand {
                up_to: 10,
                delta: 0.5,
            },
            ReputationBand {
                up_to: 15,
                delta: 0.2,
            },
        ]
    }

    const fn default_dnf_delta() -> f64 {
        -0.5
    }

    fn default_season_rank_bonus() -> Vec<f64> {
        vec![5.0, 3.0, 2.0, 1.0]
    }

    /// Delta for a finishing position; positions beyond every band earn zero.
    #[must_use]
    pub fn delta_for_position(&self, position: u16) -> f64 {
        self.position_bands
            .iter()
            .find(|band| position <= band.up_to)
            .map_or(0.0, |band| band.delta)
    }

    /// Season-end adjustment for a 1-based championship rank.
    #[must_use]
    pub fn delta_for_season_rank(&self, rank: u16) -> f64 {
        if rank == 0 {
            return 0.0;
        }
        self.season_rank_bonus
            .get(usize::from(rank) - 1)
            .copied()
            .unwrap_or(0.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self
            .position_bands
            .windows(2)
            .all(|w| w[0].up_to < w[1].up_to)
        {
            return Err(ConfigError::Unsorted {
                field: "reputation.position_bands",
            });
        }
        Ok(())
    }
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            position_bands: Self::default_bands(),
            dnf_delta: Self::default_dnf_delta(),
            season_rank_bonus: Self::default_season_rank_bonus(),
        }
    }
}

/// Season progression policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Wear added per race at distance factor 1.0.
    #[serde(default = "ProgressionConfig::default_wear_per_race")]
    pub wear_per_race: f64,
    #[serde(default)]
    pub wear_carryover: WearCarryover,
    #[serde(default)]
    pub reputation: ReputationConfig,
    #[serde(default)]
    pub age_curve: AgeCurve,
}

impl ProgressionConfig {
    const fn default_wear_per_race() -> f64 {
        8.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.wear_per_race < 0.0 {
            return Err(ConfigError::MinViolation {
                field: "progression.wear_per_race",
                min: 0.0,
                value: self.wear_per_race,
            });
        }
        self.reputation.validate()?;
        self.age_curve.validate()?;
        Ok(())
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            wear_per_race: Self::default_wear_per_race(),
            wear_carryover: WearCarryover::default(),
            reputation: ReputationConfig::default(),
            age_curve: AgeCurve::default(),
        }
    }
}

/// Economy rates; every amount is minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default = "EconomyConfig::default_weekly_running_cost")]
    pub weekly_running_cost: i64,
    /// Balance below this floor raises the insolvency condition.
    #[serde(default)]
    pub solvency_floor: i64,
    /// The constructor's cut of organiser prize money, in permille.
    #[serde(default = "EconomyConfig::default_constructor_share_permille")]
    pub constructor_share_permille: u32,
    /// Spend required to raise a component rating by one step.
    #[serde(default = "EconomyConfig::default_upgrade_cost_per_step")]
    pub upgrade_cost_per_step: i64,
    /// Spend required to remove one point of wear.
    #[serde(default = "EconomyConfig::default_maintenance_cost_per_point")]
    pub maintenance_cost_per_point: i64,
}

impl EconomyConfig {
    const fn default_weekly_running_cost() -> i64 {
        8_000
    }

    const fn default_constructor_share_permille() -> u32 {
        300
    }

    const fn default_upgrade_cost_per_step() -> i64 {
        2_000
    }

    const fn default_maintenance_cost_per_point() -> i64 {
        100
    }

    /// The constructor's cut of an organiser prize, integer arithmetic only.
    #[must_use]
    pub fn constructor_cut(&self, prize: i64) -> i64 {
        prize * i64::from(self.constructor_share_permille) / 1_000
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.weekly_running_cost < 0 {
            return Err(ConfigError::MinViolation {
                field: "economy.weekly_running_cost",
                min: 0.0,
                value: crate::numbers::i64_to_f64(self.weekly_running_cost),
            });
        }
        if self.constructor_share_permille > 1_000 {
            return Err(ConfigError::RangeViolation {
                field: "economy.constructor_share_permille",
                min: 0.0,
                max: 1_000.0,
                value: f64::from(self.constructor_share_permille),
            });
        }
        for (field, value) in [
            ("economy.upgrade_cost_per_step", self.upgrade_cost_per_step),
            (
                "economy.maintenance_cost_per_point",
                self.maintenance_cost_per_point,
            ),
        ] {
            if value <= 0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1.0,
                    value: crate::numbers::i64_to_f64(value),
                });
            }
        }
        Ok(())
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            weekly_running_cost: Self::default_weekly_running_cost(),
            solvency_floor: 0,
            constructor_share_permille: Self::default_constructor_share_permille(),
            upgrade_cost_per_step: Self::default_upgrade_cost_per_step(),
            maintenance_cost_per_point: Self::default_maintenance_cost_per_point(),
        }
    }
}

/// Race-day condition generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDayConfig {
    #[serde(default = "RaceDayConfig::default_wet_chance")]
    pub wet_chance: f64,
    #[serde(default = "RaceDayConfig::default_base_severity")]
    pub base_severity: f64,
    /// Extra severity applied on wet race days.
    #[serde(default = "RaceDayConfig::default_wet_severity_bonus")]
    pub wet_severity_bonus: f64,
    /// Era reliability multiplier supplied by the caller's campaign era.
    #[serde(default = "RaceDayConfig::default_era_reliability")]
    pub era_reliability: f64,
}

impl RaceDayConfig {
    const fn default_wet_chance() -> f64 {
        0.35
    }

    const fn default_base_severity() -> f64 {
        0.2
    }

    const fn default_wet_severity_bonus() -> f64 {
        0.6
    }

    const fn default_era_reliability() -> f64 {
        1.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.wet_chance) {
            return Err(ConfigError::RangeViolation {
                field: "race_day.wet_chance",
                min: 0.0,
                max: 1.0,
                value: self.wet_chance,
            });
        }
        for (field, value) in [
            ("race_day.base_severity", self.base_severity),
            ("race_day.wet_severity_bonus", self.wet_severity_bonus),
            ("race_day.era_reliability", self.era_reliability),
        ] {
            if value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for RaceDayConfig {
    fn default() -> Self {
        Self {
            wet_chance: Self::default_wet_chance(),
            base_severity: Self::default_base_severity(),
            wet_severity_bonus: Self::default_wet_severity_bonus(),
            era_reliability: Self::default_era_reliability(),
        }
    }
}

/// A fixed calendar anchor placed on the same week every season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorEvent {
    pub week: u32,
    pub name: String,
    pub location: String,
    pub prestige: f64,
    #[serde(default = "default_distance_factor")]
    pub distance_factor: f64,
}

/// A filler event placed into a seeded window each season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerEvent {
    pub name: String,
    pub location: String,
    pub prestige: f64,
    #[serde(default = "default_distance_factor")]
    pub distance_factor: f64,
    /// How many instances of this event to place per season.
    #[serde(default = "FillerEvent::default_count")]
    pub count: u32,
    pub window_start: u32,
    pub window_end: u32,
}

impl FillerEvent {
    const fn default_count() -> u32 {
        1
    }
}

const fn default_distance_factor() -> f64 {
    1.0
}

/// Season calendar shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "CalendarConfig::default_weeks_per_year")]
    pub weeks_per_year: u32,
    /// Minimum spacing between placed filler events.
    #[serde(default = "CalendarConfig::default_min_gap")]
    pub min_gap: u32,
    #[serde(default)]
    pub anchors: Vec<AnchorEvent>,
    #[serde(default)]
    pub fillers: Vec<FillerEvent>,
}

impl CalendarConfig {
    const fn default_weeks_per_year() -> u32 {
        48
    }

    const fn default_min_gap() -> u32 {
        2
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.weeks_per_year == 0 {
            return Err(ConfigError::MinViolation {
                field: "calendar.weeks_per_year",
                min: 1.0,
                value: 0.0,
            });
        }
        for anchor in &self.anchors {
            if anchor.week == 0 || anchor.week > self.weeks_per_year {
                return Err(ConfigError::CalendarWeekOutOfSeason {
                    event: anchor.name.clone(),
                    week: anchor.week,
                    weeks: self.weeks_per_year,
                });
            }
        }
        for filler in &self.fillers {
            if filler.window_start > filler.window_end {
                return Err(ConfigError::CalendarWindow {
                    event: filler.name.clone(),
                    start: filler.window_start,
                    end: filler.window_end,
                });
            }
            if filler.window_end > self.weeks_per_year {
                return Err(ConfigError::CalendarWeekOutOfSeason {
                    event: filler.name.clone(),
                    week: filler.window_end,
                    weeks: self.weeks_per_year,
                });
            }
        }
        Ok(())
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            weeks_per_year: Self::default_weeks_per_year(),
            min_gap: Self::default_min_gap(),
            anchors: Vec::new(),
            fillers: Vec::new(),
        }
    }
}

/// Roster rules for decision-phase validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRules {
    #[serde(default = "RosterRules::default_seats")]
    pub seats: usize,
}

impl RosterRules {
    const fn default_seats() -> usize {
        2
    }
}

impl Default for RosterRules {
    fn default() -> Self {
        Self {
            seats: Self::default_seats(),
        }
    }
}

/// Aggregate configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub points: PointsTable,
    #[serde(default)]
    pub purse: PurseConfig,
    #[serde(default)]
    pub reliability: FailureCurve,
    #[serde(default)]
    pub pace: PaceModelConfig,
    #[serde(default)]
    pub crash: CrashConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub race_day: RaceDayConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub roster: RosterRules,
}

impl GameConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate every table before the configuration is put into service.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.points.validate()?;
        self.purse.validate()?;
        self.reliability.validate()?;
        self.pace.validate()?;
        self.crash.validate()?;
        self.progression.validate()?;
        self.economy.validate()?;
        self.race_day.validate()?;
        self.calendar.validate()?;
        Ok(())
    }

    /// The bundled standard ruleset, a 1940s-flavored championship.
    #[must_use]
    pub fn standard() -> &'static Self {
        static STANDARD: Lazy<GameConfig> = Lazy::new(|| {
            let cfg: GameConfig =
                serde_json::from_str(include_str!("../assets/data/config/standard.json"))
                    .expect("valid standard config");
            cfg.validate().expect("standard config passes validation");
            cfg
        });
        &STANDARD
    }
}

/// One sponsor blueprint from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorOffer {
    pub name: String,
    pub terms: SponsorTerms,
}

/// Catalog of sponsor offers available to a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SponsorCatalog(pub Vec<SponsorOffer>);

impl SponsorCatalog {
    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into sponsor offers.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The bundled standard sponsor catalog.
    #[must_use]
    pub fn standard() -> &'static Self {
        static STANDARD: Lazy<SponsorCatalog> = Lazy::new(|| {
            SponsorCatalog::from_json(include_str!("../assets/data/sponsors.json"))
                .expect("valid sponsor catalog")
        });
        &STANDARD
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SponsorOffer> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_beyond_table_award_zero() {
        let points = PointsTable::default();
        assert_eq!(points.award(1), 8);
        assert_eq!(points.award(6), 1);
        assert_eq!(points.award(7), 0);
        assert_eq!(points.award(0), 0);
    }

    #[test]
    fn purse_scales_with_prestige_and_skips_retirees() {
        let purse = PurseConfig {
            podium: vec![30_000, 20_000, 10_000],
            finisher_bonus: 5_000,
        };
        assert_eq!(purse.prize_for(1, true, 1.0), 30_000);
        assert_eq!(purse.prize_for(1, true, 2.0), 60_000);
        assert_eq!(purse.prize_for(4, true, 1.0), 5_000);
        assert_eq!(purse.prize_for(1, false, 1.0), 0);
    }

    #[test]
    fn age_curve_selects_band_by_age() {
        let curve = AgeCurve::default();
        assert_eq!(curve.drift_for(19), 2);
        assert_eq!(curve.drift_for(25), 1);
        assert_eq!(curve.drift_for(30), 0);
        assert_eq!(curve.drift_for(33), -1);
        assert_eq!(curve.drift_for(44), -3);
    }

    #[test]
    fn reputation_bands_cover_positions() {
        let rep = ReputationConfig::default();
        assert!((rep.delta_for_position(1) - 3.0).abs() < f64::EPSILON);
        assert!((rep.delta_for_position(4) - 1.0).abs() < f64::EPSILON);
        assert!(rep.delta_for_position(20).abs() < f64::EPSILON);
        assert!((rep.delta_for_season_rank(1) - 5.0).abs() < f64::EPSILON);
        assert!(rep.delta_for_season_rank(9).abs() < f64::EPSILON);
    }

    #[test]
    fn constructor_cut_uses_integer_arithmetic() {
        let economy = EconomyConfig::default();
        assert_eq!(economy.constructor_cut(30_000), 9_000);
        assert_eq!(economy.constructor_cut(101), 30);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let cfg = GameConfig::from_json("{}").expect("deserialize");
        assert_eq!(cfg, GameConfig::default());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn validation_rejects_out_of_band_tables() {
        let cfg = GameConfig {
            points: PointsTable(Vec::new()),
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptyTable { field: "points" })
        ));

        let cfg = GameConfig {
            crash: CrashConfig {
                fatal_chance: 1.5,
                ..CrashConfig::default()
            },
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeViolation { field, .. }) if field == "crash.fatal_chance"
        ));
    }

    #[test]
    fn validation_rejects_inverted_calendar_window() {
        let cfg = GameConfig {
            calendar: CalendarConfig {
                fillers: vec![FillerEvent {
                    name: "Backwards Cup".into(),
                    location: "Nowhere".into(),
                    prestige: 1.0,
                    distance_factor: 1.0,
                    count: 1,
                    window_start: 20,
                    window_end: 10,
                }],
                ..CalendarConfig::default()
            },
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CalendarWindow { .. })
        ));
    }

    #[test]
    fn standard_config_parses_and_validates() {
        let cfg = GameConfig::standard();
        assert!(!cfg.calendar.anchors.is_empty());
        assert!(!cfg.calendar.fillers.is_empty());
        assert!(!cfg.points.0.is_empty());
    }

    #[test]
    fn standard_sponsor_catalog_has_offers() {
        let catalog = SponsorCatalog::standard();
        assert!(!catalog.0.is_empty());
        assert!(catalog.iter().all(|s| s.terms.seasons > 0));
    }
}
