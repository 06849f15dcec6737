//! Championship standings and season progression.
//!
//! `apply_result` folds one immutable race result into the season tables and
//! entity statistics, guarded against double application. `close_season`
//! runs the end-of-season transitions: aging and skill drift by the tabulated
//! age curve, contract and sponsorship countdown, wear carryover, and
//! reputation adjustment from the final championship order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::GameConfig;
use crate::entities::{DriverId, SeasonRecord, SponsorId, TeamId, World};
use crate::error::ValidationError;
use crate::race::{Outcome, RaceResult, RetirementReason};

/// Points tables and application bookkeeping for one championship season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStandings {
    pub year: u32,
    /// Number of calendar events this season; gates season close.
    pub events_total: u32,
    pub races_applied: u32,
    driver_points: BTreeMap<DriverId, u32>,
    team_points: BTreeMap<TeamId, u32>,
    team_wins: BTreeMap<TeamId, u32>,
    /// Organiser prize earned per team over the season, minor units.
    team_prize: BTreeMap<TeamId, i64>,
    /// Identities of results already folded in; the double-application guard.
    applied: BTreeSet<u64>,
}

impl SeasonStandings {
    #[must_use]
    pub fn new(year: u32, events_total: u32) -> Self {
        Self {
            year,
            events_total,
            races_applied: 0,
            driver_points: BTreeMap::new(),
            team_points: BTreeMap::new(),
            team_wins: BTreeMap::new(),
            team_prize: BTreeMap::new(),
            applied: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn driver_points(&self, driver: DriverId) -> u32 {
        self.driver_points.get(&driver).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn team_points(&self, team: TeamId) -> u32 {
        self.team_points.get(&team).copied().unwrap_or(0)
    }

    /// Drivers ordered by points (descending), ties by id for stability.
    #[must_use]
    pub fn driver_table(&self) -> Vec<(DriverId, u32)> {
        let mut table: Vec<_> = self
            .driver_points
            .iter()
            .map(|(&id, &points)| (id, points))
            .collect();
        table.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        table
    }

    /// Teams ordered by points (descending), ties by id for stability.
    #[must_use]
    pub fn team_table(&self) -> Vec<(TeamId, u32)> {
        let mut table: Vec<_> = self
            .team_points
            .iter()
            .map(|(&id, &points)| (id, points))
            .collect();
        table.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        table
    }

    /// 1-based championship rank for a team; teams without points rank last.
    #[must_use]
    pub fn team_rank(&self, team: TeamId) -> u16 {
        let table = self.team_table();
        table
            .iter()
            .position(|(id, _)| *id == team)
            .and_then(|idx| u16::try_from(idx + 1).ok())
            .unwrap_or_else(|| u16::try_from(table.len() + 1).unwrap_or(u16::MAX))
    }

    #[must_use]
    pub const fn season_complete(&self) -> bool {
        self.races_applied >= self.events_total
    }

    /// Fold one race result into the standings and entity statistics.
    ///
    /// Rejected (with no state change) when the result belongs to another
    /// season or has already been applied, making duplicate application a
    /// structured error rather than a silent double count.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ResultSeasonMismatch` or
    /// `ValidationError::ResultAlreadyApplied`.
    pub fn apply_result(
        &mut self,
        world: &mut World,
        result: &RaceResult,
        cfg: &GameConfig,
    ) -> Result<(), ValidationError> {
        if result.year != self.year {
            return Err(ValidationError::ResultSeasonMismatch {
                result_year: result.year,
                standings_year: self.year,
            });
        }
        if !self.applied.insert(result.identity) {
            return Err(ValidationError::ResultAlreadyApplied(result.identity));
        }
        self.races_applied += 1;

        let wear = cfg.progression.wear_per_race * result.conditions.distance_factor;
        for entry in &result.classification {
            *self.driver_points.entry(entry.driver).or_default() += entry.points;
            *self.team_points.entry(entry.team).or_default() += entry.points;
            *self.team_prize.entry(entry.team).or_default() += entry.prize;

            if let Some(car) = world.cars.get_mut(&entry.car) {
                car.apply_wear(wear);
            }

            let reputation_delta = match entry.outcome {
                Outcome::Finished { .. } => {
                    cfg.progression.reputation.delta_for_position(entry.position)
                }
                Outcome::Retired { .. } => cfg.progression.reputation.dnf_delta,
            } * result.prestige;
            if let Some(team) = world.teams.get_mut(&entry.team) {
                team.adjust_reputation(reputation_delta);
            }

            if let Some(driver) = world.drivers.get_mut(&entry.driver) {
                match entry.outcome {
                    Outcome::Finished { .. } => {
                        driver
                            .career
                            .record_finish(entry.position, entry.points, entry.prize);
                        if entry.position == 1 {
                            *self.team_wins.entry(entry.team).or_default() += 1;
                        }
                    }
                    Outcome::Retired { reason, .. } => {
                        driver.career.record_retirement();
                        if let RetirementReason::Accident { fatal: true } = reason {
                            driver.deceased = true;
                            driver.retire();
                            log::warn!("{} lost in an accident at {}", driver.name, result.event_name);
                        }
                    }
                }
            }
        }

        log::debug!(
            "standings {}: applied {} ({}/{} events)",
            self.year,
            result.event_name,
            self.races_applied,
            self.events_total
        );
        Ok(())
    }

    /// Run the end-of-season transitions and report what changed.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::SeasonIncomplete` when calendar events are
    /// still to run.
    pub fn close_season(
        &self,
        world: &mut World,
        cfg: &GameConfig,
    ) -> Result<TransitionReport, ValidationError> {
        if !self.season_complete() {
            return Err(ValidationError::SeasonIncomplete(
                self.events_total - self.races_applied,
            ));
        }

        let next_year = self.year + 1;
        let mut report = TransitionReport {
            closed_year: self.year,
            champion_driver: self.driver_table().first().map(|(id, _)| *id),
            champion_team: self.team_table().first().map(|(id, _)| *id),
            retired_drivers: Vec::new(),
            expired_contracts: Vec::new(),
            expired_sponsors: Vec::new(),
        };

        // Archive the season and settle reputation from the final order.
        for team in world.teams.values_mut() {
            let rank = self.team_rank(team.id);
            team.season_history.push(SeasonRecord {
                year: self.year,
                championship_rank: rank,
                points: self.team_points.get(&team.id).copied().unwrap_or(0),
                wins: self.team_wins.get(&team.id).copied().unwrap_or(0),
                prize_money: self.team_prize.get(&team.id).copied().unwrap_or(0),
            });
            team.adjust_reputation(cfg.progression.reputation.delta_for_season_rank(rank));
        }

        // Age curve and retirement pass over every active driver.
        for driver in world.drivers.values_mut() {
            if !driver.active {
                continue;
            }
            let age = driver.age(next_year);
            driver.skills.drift(cfg.progression.age_curve.drift_for(age));

            if age >= cfg.progression.age_curve.retirement_age {
                driver.retire();
                report.retired_drivers.push(driver.id);
                continue;
            }

            if let Some(contract) = driver.contract.as_mut() {
                contract.seasons_remaining = contract.seasons_remaining.saturating_sub(1);
                if contract.seasons_remaining == 0 {
                    let team = contract.team;
                    driver.contract = None;
                    if let Some(owner) = world.teams.get_mut(&team) {
                        owner.drivers.retain(|id| *id != driver.id);
                    }
                    report.expired_contracts.push(driver.id);
                }
            }
        }
        // Drop retirees from their team rosters.
        for driver_id in &report.retired_drivers {
            for team in world.teams.values_mut() {
                team.drivers.retain(|id| id != driver_id);
            }
        }

        for sponsor in world.sponsors.values_mut() {
            if !sponsor.is_signed() {
                continue;
            }
            sponsor.seasons_remaining = sponsor.seasons_remaining.saturating_sub(1);
            if sponsor.seasons_remaining == 0 {
                sponsor.cancel();
                report.expired_sponsors.push(sponsor.id);
            }
        }

        for car in world.cars.values_mut() {
            match cfg.progression.wear_carryover {
                crate::config::WearCarryover::Full => {}
                crate::config::WearCarryover::Halved => car.set_wear(car.wear / 2.0),
                crate::config::WearCarryover::Reset => car.set_wear(0.0),
            }
        }

        log::info!(
            "season {} closed: {} retirements, {} expired contracts, {} lapsed sponsorships",
            self.year,
            report.retired_drivers.len(),
            report.expired_contracts.len(),
            report.expired_sponsors.len()
        );
        Ok(report)
    }
}

/// What changed during a season transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub closed_year: u32,
    pub champion_driver: Option<DriverId>,
    pub champion_team: Option<TeamId>,
    pub retired_drivers: Vec<DriverId>,
    pub expired_contracts: Vec<DriverId>,
    pub expired_sponsors: Vec<SponsorId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Contract, SkillSet, SponsorTerms};
    use crate::race::{Conditions, Entrant, resolve_race};

    fn fixture() -> (World, GameConfig, Vec<(DriverId, crate::entities::CarId)>) {
        let mut world = World::default();
        let cfg = GameConfig::default();
        let mut pairs = Vec::new();
        for idx in 0..4 {
            let team = world.add_team(&format!("Team {idx}"), 100_000);
            let driver =
                world.add_driver(&format!("Driver {idx}"), 1922, SkillSet::new(60, 70, 60));
            world.drivers.get_mut(&driver).unwrap().contract = Some(Contract {
                team,
                wage: 5_000,
                seasons_remaining: 2,
            });
            world.teams.get_mut(&team).unwrap().drivers.push(driver);
            let car = world.add_car(team, 60, 60, 85);
            pairs.push((driver, car));
        }
        (world, cfg, pairs)
    }

    fn run_race(
        world: &World,
        cfg: &GameConfig,
        pairs: &[(DriverId, crate::entities::CarId)],
        seed: u64,
    ) -> RaceResult {
        let entrants: Vec<Entrant<'_>> = pairs
            .iter()
            .map(|(driver, car)| Entrant {
                driver: &world.drivers[driver],
                car: &world.cars[car],
            })
            .collect();
        let event = crate::entities::Event {
            name: "Marbury Grand Prix".into(),
            location: "Marbury Park".into(),
            week: 14,
            prestige: 1.3,
            distance_factor: 1.0,
        };
        resolve_race(&entrants, &event, 1947, Conditions::default(), cfg, seed).unwrap()
    }

    #[test]
    fn apply_result_accumulates_points_and_career() {
        let (mut world, cfg, pairs) = fixture();
        let mut standings = SeasonStandings::new(1947, 3);
        let result = run_race(&world, &cfg, &pairs, 21);

        standings.apply_result(&mut world, &result, &cfg).unwrap();

        let winner = result.classification[0].driver;
        if result.classification[0].outcome.is_finish() {
            assert_eq!(standings.driver_points(winner), cfg.points.award(1));
            assert_eq!(world.drivers[&winner].career.wins, 1);
        }
        assert_eq!(standings.races_applied, 1);
        for (_, car_id) in &pairs {
            assert!(world.cars[car_id].wear > 0.0, "race wear not applied");
        }
    }

    #[test]
    fn duplicate_application_is_rejected_without_double_count() {
        let (mut world, cfg, pairs) = fixture();
        let mut standings = SeasonStandings::new(1947, 3);
        let result = run_race(&world, &cfg, &pairs, 5);

        standings.apply_result(&mut world, &result, &cfg).unwrap();
        let points_after_first: Vec<_> = pairs
            .iter()
            .map(|(driver, _)| standings.driver_points(*driver))
            .collect();

        let err = standings.apply_result(&mut world, &result, &cfg);
        assert!(matches!(err, Err(ValidationError::ResultAlreadyApplied(_))));

        let points_after_second: Vec<_> = pairs
            .iter()
            .map(|(driver, _)| standings.driver_points(*driver))
            .collect();
        assert_eq!(points_after_first, points_after_second);
        assert_eq!(standings.races_applied, 1);
    }

    #[test]
    fn result_from_wrong_season_is_rejected() {
        let (mut world, cfg, pairs) = fixture();
        let mut standings = SeasonStandings::new(1948, 3);
        let result = run_race(&world, &cfg, &pairs, 5);
        assert!(matches!(
            standings.apply_result(&mut world, &result, &cfg),
            Err(ValidationError::ResultSeasonMismatch {
                result_year: 1947,
                standings_year: 1948,
            })
        ));
    }

    #[test]
    fn close_season_requires_full_calendar() {
        let (mut world, cfg, pairs) = fixture();
        let mut standings = SeasonStandings::new(1947, 2);
        let result = run_race(&world, &cfg, &pairs, 9);
        standings.apply_result(&mut world, &result, &cfg).unwrap();

        assert!(matches!(
            standings.close_season(&mut world, &cfg),
            Err(ValidationError::SeasonIncomplete(1))
        ));
    }

    #[test]
    fn season_close_ages_drivers_and_counts_down_contracts() {
        let (mut world, cfg, pairs) = fixture();
        let veteran = world.add_driver("Old Hand", 1947 + 1 - 40, SkillSet::new(70, 70, 70));
        let mut standings = SeasonStandings::new(1947, 1);
        let result = run_race(&world, &cfg, &pairs, 13);
        standings.apply_result(&mut world, &result, &cfg).unwrap();

        let skills_before = world.drivers[&pairs[0].0].skills;
        let report = standings.close_season(&mut world, &cfg).unwrap();

        assert_eq!(report.closed_year, 1947);
        assert!(report.retired_drivers.contains(&veteran));
        assert!(!world.drivers[&veteran].active);

        // Born 1922, age 26 next season: the default curve grants +1.
        let skills_after = world.drivers[&pairs[0].0].skills;
        assert_eq!(skills_after.pace, skills_before.pace + 1);

        for (driver, _) in &pairs {
            let contract = world.drivers[driver].contract.unwrap();
            assert_eq!(contract.seasons_remaining, 1);
        }

        for team in world.teams.values() {
            assert_eq!(team.season_history.len(), 1);
            assert_eq!(team.season_history[0].year, 1947);
        }
    }

    #[test]
    fn season_close_expires_contracts_and_sponsors() {
        let (mut world, cfg, pairs) = fixture();
        let (driver, _) = pairs[0];
        world
            .drivers
            .get_mut(&driver)
            .unwrap()
            .contract
            .as_mut()
            .unwrap()
            .seasons_remaining = 1;

        let sponsor = world.add_sponsor(
            "Apex Lubricants",
            SponsorTerms {
                signing_bonus: 0,
                per_start: 1_000,
                per_point: 0,
                per_podium: 0,
                seasons: 1,
                goal_starts: 0,
                goal_podiums: 0,
                goal_starts_bonus: 0,
                goal_podiums_bonus: 0,
            },
        );
        {
            let entry = world.sponsors.get_mut(&sponsor).unwrap();
            entry.team = Some(TeamId(1));
            entry.seasons_remaining = 1;
        }

        let mut standings = SeasonStandings::new(1947, 1);
        let result = run_race(&world, &cfg, &pairs, 31);
        standings.apply_result(&mut world, &result, &cfg).unwrap();
        let report = standings.close_season(&mut world, &cfg).unwrap();

        assert!(report.expired_contracts.contains(&driver));
        assert!(world.drivers[&driver].is_free_agent());
        assert!(report.expired_sponsors.contains(&sponsor));
        assert!(!world.sponsors[&sponsor].is_signed());
    }

    #[test]
    fn wear_carryover_policy_applies() {
        let (mut world, cfg, pairs) = fixture();
        let car = pairs[0].1;
        world.cars.get_mut(&car).unwrap().set_wear(40.0);

        let mut standings = SeasonStandings::new(1947, 0);
        let _ = standings.close_season(&mut world, &cfg).unwrap();
        // Default policy halves wear between seasons.
        assert!((world.cars[&car].wear - 20.0).abs() < f64::EPSILON);
    }
}
