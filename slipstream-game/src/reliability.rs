//! Mechanical failure probability model.

use crate::config::FailureCurve;
use crate::entities::{Car, RATING_MAX, WEAR_MAX};
use crate::numbers::clamp_unit;
use crate::race::Conditions;

/// Probability that the car suffers a race-ending mechanical failure over a
/// full event under the given conditions.
///
/// Pure function of its inputs. The result is clamped to `[0, 1]` even for
/// out-of-band inputs such as wear beyond the nominal maximum, and is
/// monotonic: more wear, lower reliability, or harsher conditions never
/// reduce the probability.
#[must_use]
pub fn failure_probability(car: &Car, conditions: &Conditions, curve: &FailureCurve) -> f64 {
    let rating_deficit = 1.0 - f64::from(car.reliability.min(RATING_MAX)) / f64::from(RATING_MAX);
    let wear_fraction = (car.wear / WEAR_MAX).max(0.0);

    let mechanical = curve.wear_coeff.mul_add(
        wear_fraction,
        curve.rating_coeff.mul_add(rating_deficit, curve.base),
    );
    let conditions_factor = curve.severity_coeff.mul_add(conditions.severity.max(0.0), 1.0)
        * conditions.distance_factor.max(0.0)
        * conditions.era_reliability.max(0.0);

    clamp_unit(mechanical * conditions_factor)
}

/// Split a whole-race failure probability into an equal per-checkpoint
/// probability for `checkpoints` independent rolls.
///
/// Chosen so that surviving every checkpoint roll has the same likelihood as
/// surviving the whole-race probability: `(1 - q)^n = 1 - p`.
#[must_use]
pub fn per_checkpoint_probability(race_probability: f64, checkpoints: u32) -> f64 {
    if checkpoints == 0 {
        return 0.0;
    }
    let survival = 1.0 - clamp_unit(race_probability);
    clamp_unit(1.0 - survival.powf(1.0 / f64::from(checkpoints)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Car, CarId, TeamId};
    use crate::race::Weather;

    fn car(reliability: u8, wear: f64) -> Car {
        Car {
            id: CarId(1),
            team: TeamId(2),
            engine_power: 50,
            chassis_grip: 50,
            reliability,
            wear,
        }
    }

    fn conditions(severity: f64) -> Conditions {
        Conditions {
            weather: Weather::Dry,
            severity,
            distance_factor: 1.0,
            era_reliability: 1.0,
        }
    }

    #[test]
    fn probability_stays_in_unit_interval() {
        let curve = FailureCurve::default();
        for reliability in [0_u8, 30, 90, 100] {
            for wear in [0.0, 50.0, 100.0, 400.0] {
                for severity in [0.0, 1.0, 50.0] {
                    let p = failure_probability(&car(reliability, wear), &conditions(severity), &curve);
                    assert!((0.0..=1.0).contains(&p), "p={p} out of range");
                }
            }
        }
    }

    #[test]
    fn monotonic_in_wear_and_severity() {
        let curve = FailureCurve::default();
        let base = failure_probability(&car(60, 10.0), &conditions(0.2), &curve);
        let worn = failure_probability(&car(60, 80.0), &conditions(0.2), &curve);
        let harsh = failure_probability(&car(60, 10.0), &conditions(1.5), &curve);
        assert!(worn >= base);
        assert!(harsh >= base);
    }

    #[test]
    fn higher_rating_never_raises_probability() {
        let curve = FailureCurve::default();
        let fragile = failure_probability(&car(30, 40.0), &conditions(0.5), &curve);
        let sturdy = failure_probability(&car(90, 40.0), &conditions(0.5), &curve);
        assert!(sturdy <= fragile);
    }

    #[test]
    fn longer_races_raise_probability() {
        let curve = FailureCurve::default();
        let sprint = Conditions {
            distance_factor: 0.8,
            ..conditions(0.2)
        };
        let endurance = Conditions {
            distance_factor: 1.6,
            ..conditions(0.2)
        };
        let short = failure_probability(&car(60, 30.0), &sprint, &curve);
        let long = failure_probability(&car(60, 30.0), &endurance, &curve);
        assert!(long > short);
    }

    #[test]
    fn checkpoint_split_preserves_survival() {
        let p = 0.3;
        let q = per_checkpoint_probability(p, 3);
        let survival = (1.0 - q).powi(3);
        assert!((survival - (1.0 - p)).abs() < 1e-12);
        assert!(per_checkpoint_probability(p, 0).abs() < f64::EPSILON);
        assert!((per_checkpoint_probability(2.0, 3) - 1.0).abs() < f64::EPSILON);
    }
}
