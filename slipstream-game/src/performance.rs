//! Race pace model: car specs and driver skill into a comparable pace value.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PaceModelConfig;
use crate::entities::{Car, Driver, RATING_MAX};
use crate::race::Conditions;

/// A resolved pace sample for one entrant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceSample {
    /// Deterministic component: weighted car pace times the driver factor.
    pub expected: f64,
    /// Bounded race-day variance added on top.
    pub noise: f64,
}

impl PaceSample {
    /// The value finishers are ranked by.
    #[must_use]
    pub fn resolved(&self) -> f64 {
        self.expected + self.noise
    }
}

/// Compute the entrant's pace for one race.
///
/// The car contributes a condition-weighted sum of engine power and chassis
/// grip (wet weather weights grip higher); the driver contributes a bounded
/// multiplicative factor, so even a minimum-skill driver keeps pace positive.
/// Variance is uniform bounded noise scaled down by driver consistency and is
/// the only randomness consumed, which keeps a fixed-seed race reproducible.
#[must_use]
pub fn race_pace<R: Rng>(
    car: &Car,
    driver: &Driver,
    conditions: &Conditions,
    cfg: &PaceModelConfig,
    rng: &mut R,
) -> PaceSample {
    let weights = cfg.weights_for(conditions.weather);
    let car_pace = weights.engine.mul_add(
        f64::from(car.engine_power),
        weights.grip * f64::from(car.chassis_grip),
    );

    let skill_offset = (driver.skills.overall() - 50.0) / 50.0;
    let driver_factor = cfg
        .driver_influence
        .mul_add(skill_offset, 1.0)
        .clamp(cfg.driver_floor, cfg.driver_ceiling);

    let expected = car_pace * driver_factor;

    let consistency_relief =
        1.0 - f64::from(driver.skills.consistency.min(RATING_MAX)) / f64::from(RATING_MAX);
    let amplitude = cfg.noise_scale * consistency_relief * expected;
    let noise = rng.gen_range(-1.0..=1.0) * amplitude;

    PaceSample { expected, noise }
}
