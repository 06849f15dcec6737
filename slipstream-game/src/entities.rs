//! Entity model: drivers, cars, teams, sponsors, and calendar events.
//!
//! Identity is immutable (ids handed out by [`World`]); mutable state lives in
//! the entity structs and is only touched by the standings and economy phases.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::economy::Treasury;

/// Upper bound for skill attributes and component ratings.
pub const RATING_MAX: u8 = 100;

/// Upper bound for accumulated car wear.
pub const WEAR_MAX: f64 = 100.0;

macro_rules! entity_id {
    ($name:ident, $tag:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($tag, "-{}"), self.0)
            }
        }
    };
}

entity_id!(DriverId, "drv");
entity_id!(TeamId, "team");
entity_id!(CarId, "car");
entity_id!(SponsorId, "spn");

/// Bounded skill attributes, all on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SkillSet {
    pub pace: u8,
    pub consistency: u8,
    pub racecraft: u8,
}

impl SkillSet {
    #[must_use]
    pub fn new(pace: u8, consistency: u8, racecraft: u8) -> Self {
        Self {
            pace: pace.min(RATING_MAX),
            consistency: consistency.min(RATING_MAX),
            racecraft: racecraft.min(RATING_MAX),
        }
    }

    /// Apply a signed per-season drift to every attribute, saturating at the
    /// 1..=100 band so a declining veteran never reaches zero skill.
    pub fn drift(&mut self, delta: i8) {
        for attr in [&mut self.pace, &mut self.consistency, &mut self.racecraft] {
            let shifted = i16::from(*attr) + i16::from(delta);
            *attr = u8::try_from(shifted.clamp(1, i16::from(RATING_MAX))).unwrap_or(1);
        }
    }

    /// Mean of the three attributes, used as the driver's overall influence.
    #[must_use]
    pub fn overall(&self) -> f64 {
        f64::from(u16::from(self.pace) + u16::from(self.consistency) + u16::from(self.racecraft))
            / 3.0
    }
}

/// Employment terms binding a driver to a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub team: TeamId,
    /// Weekly wage in minor currency units.
    pub wage: i64,
    /// Whole seasons left on the deal; zero after countdown means expiry.
    pub seasons_remaining: u8,
}

/// Accumulated career record for a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CareerStats {
    pub starts: u32,
    pub wins: u32,
    pub podiums: u32,
    pub dnfs: u32,
    pub points: u32,
    /// Prize money attributed to the driver, minor units.
    pub prize_money: i64,
    pub best_finish: Option<u16>,
}

impl CareerStats {
    pub fn record_finish(&mut self, position: u16, points: u32, prize: i64) {
        self.starts += 1;
        self.points += points;
        self.prize_money += prize;
        if position == 1 {
            self.wins += 1;
        }
        if position <= 3 {
            self.podiums += 1;
        }
        if self.best_finish.is_none_or(|best| position < best) {
            self.best_finish = Some(position);
        }
    }

    pub fn record_retirement(&mut self) {
        self.starts += 1;
        self.dnfs += 1;
    }
}

/// A driver, possibly a free agent (no contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub birth_year: u32,
    pub skills: SkillSet,
    #[serde(default)]
    pub contract: Option<Contract>,
    #[serde(default)]
    pub career: CareerStats,
    /// False once retired or deceased; inactive drivers never enter races.
    #[serde(default = "Driver::default_active")]
    pub active: bool,
    #[serde(default)]
    pub deceased: bool,
}

impl Driver {
    const fn default_active() -> bool {
        true
    }

    #[must_use]
    pub const fn age(&self, current_year: u32) -> u32 {
        current_year.saturating_sub(self.birth_year)
    }

    #[must_use]
    pub const fn is_free_agent(&self) -> bool {
        self.contract.is_none()
    }

    /// Remove the driver from the active pool.
    pub fn retire(&mut self) {
        self.active = false;
        self.contract = None;
    }
}

/// Independently upgradable car component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarComponent {
    Engine,
    Chassis,
    Reliability,
}

/// A car, exclusively owned by one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub team: TeamId,
    /// Engine power rating, 0-100.
    pub engine_power: u8,
    /// Chassis grip rating, 0-100.
    pub chassis_grip: u8,
    /// Reliability rating, 0-100; higher strictly lowers failure probability.
    pub reliability: u8,
    /// Cumulative wear, 0-100; grows with races and drops with maintenance.
    #[serde(default)]
    pub wear: f64,
}

impl Car {
    #[must_use]
    pub const fn rating(&self, component: CarComponent) -> u8 {
        match component {
            CarComponent::Engine => self.engine_power,
            CarComponent::Chassis => self.chassis_grip,
            CarComponent::Reliability => self.reliability,
        }
    }

    /// Raise a component rating, saturating at the rating cap.
    pub fn upgrade(&mut self, component: CarComponent, steps: u8) {
        let slot = match component {
            CarComponent::Engine => &mut self.engine_power,
            CarComponent::Chassis => &mut self.chassis_grip,
            CarComponent::Reliability => &mut self.reliability,
        };
        *slot = slot.saturating_add(steps).min(RATING_MAX);
    }

    /// Accumulate race wear, clamped to the wear ceiling.
    pub fn apply_wear(&mut self, amount: f64) {
        if amount <= 0.0 || !amount.is_finite() {
            return;
        }
        self.wear = (self.wear + amount).min(WEAR_MAX);
    }

    /// Reduce wear through maintenance, clamping at zero.
    pub fn service(&mut self, amount: f64) {
        if amount <= 0.0 || !amount.is_finite() {
            return;
        }
        self.wear = (self.wear - amount).max(0.0);
    }

    /// Set wear directly, clamped to valid bounds.
    pub fn set_wear(&mut self, wear: f64) {
        self.wear = wear.clamp(0.0, WEAR_MAX);
    }
}

/// One line of a team's season history archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub year: u32,
    pub championship_rank: u16,
    pub points: u32,
    pub wins: u32,
    /// Prize money earned over the season, minor units.
    pub prize_money: i64,
}

/// A constructor entry: roster, garage, treasury, and standing in the paddock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub drivers: Vec<DriverId>,
    #[serde(default)]
    pub cars: Vec<CarId>,
    #[serde(default)]
    pub treasury: Treasury,
    /// Reputation score, 0-100; moves with results and feeds sponsorship.
    #[serde(default = "Team::default_reputation")]
    pub reputation: f64,
    #[serde(default)]
    pub season_history: Vec<SeasonRecord>,
}

impl Team {
    const fn default_reputation() -> f64 {
        10.0
    }

    /// Adjust reputation, clamped to the 0-100 band.
    pub fn adjust_reputation(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.reputation = (self.reputation + delta).clamp(0.0, 100.0);
    }
}

/// Offered sponsorship terms. All money fields are minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorTerms {
    #[serde(default)]
    pub signing_bonus: i64,
    /// Paid for taking the start, even on a retirement.
    #[serde(default)]
    pub per_start: i64,
    #[serde(default)]
    pub per_point: i64,
    #[serde(default)]
    pub per_podium: i64,
    /// Contract duration in seasons.
    pub seasons: u8,
    /// Performance goals gating the one-off goal bonuses.
    #[serde(default)]
    pub goal_starts: u32,
    #[serde(default)]
    pub goal_podiums: u32,
    #[serde(default)]
    pub goal_starts_bonus: i64,
    #[serde(default)]
    pub goal_podiums_bonus: i64,
}

/// A sponsor: either an open offer or bound to exactly one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: SponsorId,
    pub name: String,
    pub terms: SponsorTerms,
    #[serde(default)]
    pub team: Option<TeamId>,
    #[serde(default)]
    pub seasons_remaining: u8,
    /// Progress toward the performance goals.
    #[serde(default)]
    pub races_started: u32,
    #[serde(default)]
    pub podiums: u32,
    #[serde(default)]
    pub goal_starts_met: bool,
    #[serde(default)]
    pub goal_podiums_met: bool,
}

impl Sponsor {
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.team.is_some()
    }

    /// Release the sponsor from its team, resetting goal progress.
    pub fn cancel(&mut self) {
        self.team = None;
        self.seasons_remaining = 0;
        self.races_started = 0;
        self.podiums = 0;
        self.goal_starts_met = false;
        self.goal_podiums_met = false;
    }
}

/// A calendar entry. Read-only reference data for the race engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub location: String,
    /// Week index within the season.
    pub week: u32,
    /// Prestige weight scaling the purse and reputation swings.
    pub prestige: f64,
    /// Race distance relative to a standard-length event.
    #[serde(default = "Event::default_distance_factor")]
    pub distance_factor: f64,
}

impl Event {
    const fn default_distance_factor() -> f64 {
        1.0
    }
}

/// Stable 64-bit identity for a (driver, car) entrant pairing.
///
/// Used as the final ranking tie-break so ordering never depends on map
/// iteration or float quirks.
#[must_use]
pub fn entrant_key(driver: DriverId, car: CarId) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write_u32(driver.0);
    hasher.write_u32(car.0);
    hasher.finish()
}

/// The full entity population of one simulation.
///
/// Teams exclusively own their cars; drivers and sponsors without a team
/// reference form the free-agent and open-offer pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct World {
    pub drivers: BTreeMap<DriverId, Driver>,
    pub teams: BTreeMap<TeamId, Team>,
    pub cars: BTreeMap<CarId, Car>,
    pub sponsors: BTreeMap<SponsorId, Sponsor>,
    next_id: u32,
}

impl World {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_team(&mut self, name: &str, opening_balance: i64) -> TeamId {
        let id = TeamId(self.next_id());
        self.teams.insert(
            id,
            Team {
                id,
                name: name.to_string(),
                drivers: Vec::new(),
                cars: Vec::new(),
                treasury: Treasury::new(opening_balance),
                reputation: Team::default_reputation(),
                season_history: Vec::new(),
            },
        );
        id
    }

    pub fn add_driver(&mut self, name: &str, birth_year: u32, skills: SkillSet) -> DriverId {
        let id = DriverId(self.next_id());
        self.drivers.insert(
            id,
            Driver {
                id,
                name: name.to_string(),
                birth_year,
                skills,
                contract: None,
                career: CareerStats::default(),
                active: true,
                deceased: false,
            },
        );
        id
    }

    /// Build a car for the owning team and register it on the roster.
    pub fn add_car(&mut self, team: TeamId, engine: u8, chassis: u8, reliability: u8) -> CarId {
        let id = CarId(self.next_id());
        self.cars.insert(
            id,
            Car {
                id,
                team,
                engine_power: engine.min(RATING_MAX),
                chassis_grip: chassis.min(RATING_MAX),
                reliability: reliability.min(RATING_MAX),
                wear: 0.0,
            },
        );
        if let Some(owner) = self.teams.get_mut(&team) {
            owner.cars.push(id);
        }
        id
    }

    pub fn add_sponsor(&mut self, name: &str, terms: SponsorTerms) -> SponsorId {
        let id = SponsorId(self.next_id());
        self.sponsors.insert(
            id,
            Sponsor {
                id,
                name: name.to_string(),
                terms,
                team: None,
                seasons_remaining: 0,
                races_started: 0,
                podiums: 0,
                goal_starts_met: false,
                goal_podiums_met: false,
            },
        );
        id
    }

    /// Drivers currently without a contract and still active.
    pub fn free_agents(&self) -> impl Iterator<Item = &Driver> {
        self.drivers
            .values()
            .filter(|d| d.active && d.is_free_agent())
    }

    /// Sponsors not currently bound to any team.
    pub fn open_sponsor_offers(&self) -> impl Iterator<Item = &Sponsor> {
        self.sponsors.values().filter(|s| !s.is_signed())
    }

    /// First active contracted driver for the team, in roster order.
    #[must_use]
    pub fn lead_driver(&self, team: TeamId) -> Option<&Driver> {
        let roster = &self.teams.get(&team)?.drivers;
        roster
            .iter()
            .filter_map(|id| self.drivers.get(id))
            .find(|d| d.active)
    }

    /// First car owned by the team, in garage order.
    #[must_use]
    pub fn lead_car(&self, team: TeamId) -> Option<&Car> {
        let garage = &self.teams.get(&team)?.cars;
        garage.iter().filter_map(|id| self.cars.get(id)).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_drift_saturates_within_band() {
        let mut skills = SkillSet::new(2, 99, 50);
        skills.drift(-5);
        assert_eq!(skills.pace, 1);
        assert_eq!(skills.consistency, 94);

        skills.drift(120);
        assert_eq!(skills.pace, 100);
        assert_eq!(skills.racecraft, 100);
    }

    #[test]
    fn skill_constructor_caps_attributes() {
        let skills = SkillSet::new(250, 40, 101);
        assert_eq!(skills.pace, 100);
        assert_eq!(skills.consistency, 40);
        assert_eq!(skills.racecraft, 100);
    }

    #[test]
    fn car_wear_stays_in_bounds() {
        let mut world = World::default();
        let team = world.add_team("Fenwick Racing", 100_000);
        let car_id = world.add_car(team, 60, 55, 70);
        let car = world.cars.get_mut(&car_id).unwrap();

        car.apply_wear(150.0);
        assert!((car.wear - WEAR_MAX).abs() < f64::EPSILON);

        car.service(500.0);
        assert!(car.wear.abs() < f64::EPSILON);

        car.apply_wear(f64::NAN);
        assert!(car.wear.abs() < f64::EPSILON);
    }

    #[test]
    fn upgrade_saturates_at_rating_cap() {
        let mut world = World::default();
        let team = world.add_team("Fenwick Racing", 0);
        let car_id = world.add_car(team, 95, 50, 50);
        let car = world.cars.get_mut(&car_id).unwrap();
        car.upgrade(CarComponent::Engine, 20);
        assert_eq!(car.engine_power, 100);
    }

    #[test]
    fn career_stats_track_bests_and_podiums() {
        let mut career = CareerStats::default();
        career.record_finish(3, 4, 10_000);
        career.record_finish(1, 8, 30_000);
        career.record_retirement();

        assert_eq!(career.starts, 3);
        assert_eq!(career.wins, 1);
        assert_eq!(career.podiums, 2);
        assert_eq!(career.dnfs, 1);
        assert_eq!(career.best_finish, Some(1));
        assert_eq!(career.prize_money, 40_000);
    }

    #[test]
    fn free_agent_pool_excludes_contracted_and_inactive() {
        let mut world = World::default();
        let team = world.add_team("Fenwick Racing", 0);
        let hired = world.add_driver("A. Moss", 1920, SkillSet::new(70, 60, 50));
        let free = world.add_driver("B. Varga", 1925, SkillSet::new(50, 50, 50));
        let retired = world.add_driver("C. Old", 1900, SkillSet::new(40, 40, 40));

        world.drivers.get_mut(&hired).unwrap().contract = Some(Contract {
            team,
            wage: 5_000,
            seasons_remaining: 2,
        });
        world.drivers.get_mut(&retired).unwrap().retire();

        let pool: Vec<_> = world.free_agents().map(|d| d.id).collect();
        assert_eq!(pool, vec![free]);
    }

    #[test]
    fn entrant_key_is_stable_and_distinct() {
        let a = entrant_key(DriverId(1), CarId(2));
        let b = entrant_key(DriverId(1), CarId(2));
        let c = entrant_key(DriverId(2), CarId(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn world_ids_are_unique_across_entity_kinds() {
        let mut world = World::default();
        let team = world.add_team("Team", 0);
        let driver = world.add_driver("D", 1920, SkillSet::default());
        let car = world.add_car(team, 50, 50, 50);
        assert_ne!(team.0, driver.0);
        assert_ne!(driver.0, car.0);
    }
}
