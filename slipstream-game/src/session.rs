//! The simulation context: one campaign, no globals.
//!
//! A [`Session`] owns the world, the configuration, the standings, and the
//! RNG bundle, so multiple independent campaigns can run side by side. The
//! caller drives it with decision-phase operations between weeks and
//! [`Session::advance_week`] to move time; every operation returns a
//! structured outcome and mutates nothing when it fails validation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calendar::generate_calendar;
use crate::config::GameConfig;
use crate::economy::{Settlement, SettlementReport, settle, sponsor_race_payout};
use crate::entities::{
    CarComponent, CarId, Contract, DriverId, Event, SponsorId, TeamId, World,
};
use crate::error::{InvariantViolation, ValidationError};
use crate::market::{MarketEvent, MarketState};
use crate::race::{Conditions, Entrant, RaceResult, Weather, resolve_race};
use crate::rng::RngBundle;
use crate::standings::{SeasonStandings, TransitionReport};

/// Everything that happened during one advanced week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekReport {
    pub year: u32,
    pub week: u32,
    pub race: Option<RaceResult>,
    /// The player team's weekly settlement.
    pub settlement: SettlementReport,
    pub season_transition: Option<TransitionReport>,
}

/// One running campaign.
#[derive(Debug, Clone)]
pub struct Session {
    config: GameConfig,
    world: World,
    standings: SeasonStandings,
    calendar: Vec<Event>,
    year: u32,
    week: u32,
    player_team: TeamId,
    entered_this_week: bool,
    pending_upgrade_spend: i64,
    pending_maintenance_spend: i64,
    market: MarketState,
    rng: RngBundle,
}

impl Session {
    /// Start a campaign.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownTeam` when the player team is not in
    /// the world.
    ///
    /// # Panics
    ///
    /// Panics when the supplied configuration violates validation rules;
    /// callers own config validation per the configuration boundary.
    pub fn new(
        config: GameConfig,
        world: World,
        player_team: TeamId,
        start_year: u32,
        seed: u64,
    ) -> Result<Self, ValidationError> {
        config.validate().expect("valid game config");
        if !world.teams.contains_key(&player_team) {
            return Err(ValidationError::UnknownTeam(player_team.to_string()));
        }
        let calendar = generate_calendar(start_year, &config.calendar);
        let events_total = u32::try_from(calendar.len()).unwrap_or(u32::MAX);
        Ok(Self {
            config,
            world,
            standings: SeasonStandings::new(start_year, events_total),
            calendar,
            year: start_year,
            week: 1,
            player_team,
            entered_this_week: false,
            pending_upgrade_spend: 0,
            pending_maintenance_spend: 0,
            market: MarketState::default(),
            rng: RngBundle::from_campaign_seed(seed),
        })
    }

    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub const fn standings(&self) -> &SeasonStandings {
        &self.standings
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn calendar(&self) -> &[Event] {
        &self.calendar
    }

    #[must_use]
    pub const fn year(&self) -> u32 {
        self.year
    }

    #[must_use]
    pub const fn week(&self) -> u32 {
        self.week
    }

    #[must_use]
    pub const fn player_team(&self) -> TeamId {
        self.player_team
    }

    #[must_use]
    pub const fn market(&self) -> &MarketState {
        &self.market
    }

    /// The event scheduled for the current week, if any.
    #[must_use]
    pub fn current_event(&self) -> Option<&Event> {
        self.calendar.iter().find(|e| e.week == self.week)
    }

    /// The player's treasury balance in minor units.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.player().treasury.balance()
    }

    fn player(&self) -> &crate::entities::Team {
        self.world
            .teams
            .get(&self.player_team)
            .unwrap_or_else(|| InvariantViolation::raise("player team vanished from world"))
    }

    /// Money already committed this week but not yet settled.
    const fn pending_spend(&self) -> i64 {
        self.pending_upgrade_spend + self.pending_maintenance_spend
    }

    fn ensure_affordable(&self, spend: i64) -> Result<(), ValidationError> {
        let available = self.balance() - self.pending_spend();
        if spend > available {
            return Err(ValidationError::InsufficientFunds {
                needed: spend,
                available,
            });
        }
        Ok(())
    }

    /// Fold one external market event into the campaign's rate tables.
    pub fn apply_market_event(&mut self, event: MarketEvent) {
        self.market.apply(event);
        log::debug!(
            "market now sponsor {}‰ / purse {}‰",
            self.market.sponsor_rate_permille,
            self.market.purse_permille
        );
    }

    /// Put a free agent under contract on the player roster.
    ///
    /// # Errors
    ///
    /// Rejected before any mutation when the driver is unknown, inactive, or
    /// already contracted, the wage or duration is non-positive, or the
    /// roster is full.
    pub fn hire_driver(
        &mut self,
        driver_id: DriverId,
        wage: i64,
        seasons: u8,
    ) -> Result<(), ValidationError> {
        let seats = self.config.roster.seats;
        let roster_len = self.player().drivers.len();
        let driver = self
            .world
            .drivers
            .get(&driver_id)
            .ok_or_else(|| ValidationError::UnknownDriver(driver_id.to_string()))?;
        if !driver.active {
            return Err(ValidationError::DriverInactive(driver.name.clone()));
        }
        if driver.contract.is_some() {
            return Err(ValidationError::DriverAlreadyContracted(driver.name.clone()));
        }
        if wage <= 0 {
            return Err(ValidationError::NonPositiveWage(wage));
        }
        if seasons == 0 {
            return Err(ValidationError::ZeroContractDuration);
        }
        if roster_len >= seats {
            return Err(ValidationError::RosterFull(seats));
        }

        let team = self.player_team;
        if let Some(driver) = self.world.drivers.get_mut(&driver_id) {
            driver.contract = Some(Contract {
                team,
                wage,
                seasons_remaining: seasons,
            });
        }
        if let Some(roster) = self.world.teams.get_mut(&team) {
            roster.drivers.push(driver_id);
        }
        log::info!("hired driver {driver_id} at {wage}/week for {seasons} seasons");
        Ok(())
    }

    /// Release a driver from the player roster; the contract is torn up.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DriverNotOnRoster` when the driver is not on
    /// the player roster.
    pub fn fire_driver(&mut self, driver_id: DriverId) -> Result<(), ValidationError> {
        if !self.player().drivers.contains(&driver_id) {
            return Err(ValidationError::DriverNotOnRoster(driver_id.to_string()));
        }
        if let Some(driver) = self.world.drivers.get_mut(&driver_id) {
            driver.contract = None;
        }
        if let Some(team) = self.world.teams.get_mut(&self.player_team) {
            team.drivers.retain(|id| *id != driver_id);
        }
        log::info!("released driver {driver_id}");
        Ok(())
    }

    /// Buy component development. The rating improves immediately; the spend
    /// settles with the week.
    ///
    /// # Errors
    ///
    /// Rejected when the spend is non-positive or below one upgrade step, the
    /// car is unknown or not the player's, or funds are insufficient.
    pub fn upgrade_car(
        &mut self,
        car_id: CarId,
        component: CarComponent,
        spend: i64,
    ) -> Result<u8, ValidationError> {
        if spend <= 0 {
            return Err(ValidationError::NonPositiveSpend(spend));
        }
        let per_step = self.config.economy.upgrade_cost_per_step;
        let steps = spend / per_step;
        if steps == 0 {
            return Err(ValidationError::SpendBelowStep(spend));
        }
        let owner = self
            .world
            .cars
            .get(&car_id)
            .ok_or_else(|| ValidationError::UnknownCar(car_id.to_string()))?
            .team;
        if owner != self.player_team {
            return Err(ValidationError::CarNotOwned(car_id.to_string()));
        }
        self.ensure_affordable(spend)?;

        let steps = u8::try_from(steps.min(i64::from(u8::MAX))).unwrap_or(u8::MAX);
        if let Some(car) = self.world.cars.get_mut(&car_id) {
            car.upgrade(component, steps);
        }
        self.pending_upgrade_spend += spend;
        log::info!("upgraded {car_id} {component:?} by {steps} steps for {spend}");
        Ok(steps)
    }

    /// Buy maintenance to reduce accumulated wear; settles with the week.
    ///
    /// # Errors
    ///
    /// Rejected when the spend is non-positive, the car is unknown or not the
    /// player's, or funds are insufficient.
    pub fn maintain_car(&mut self, car_id: CarId, spend: i64) -> Result<(), ValidationError> {
        if spend <= 0 {
            return Err(ValidationError::NonPositiveMaintenance(spend));
        }
        let owner = self
            .world
            .cars
            .get(&car_id)
            .ok_or_else(|| ValidationError::UnknownCar(car_id.to_string()))?
            .team;
        if owner != self.player_team {
            return Err(ValidationError::CarNotOwned(car_id.to_string()));
        }
        self.ensure_affordable(spend)?;

        let points = crate::numbers::i64_to_f64(spend)
            / crate::numbers::i64_to_f64(self.config.economy.maintenance_cost_per_point);
        if let Some(car) = self.world.cars.get_mut(&car_id) {
            car.service(points);
        }
        self.pending_maintenance_spend += spend;
        Ok(())
    }

    /// Sign an open sponsorship offer; the signing bonus settles immediately.
    ///
    /// # Errors
    ///
    /// Rejected when the offer is unknown or already signed by a team.
    pub fn accept_sponsor(
        &mut self,
        sponsor_id: SponsorId,
    ) -> Result<SettlementReport, ValidationError> {
        let sponsor = self
            .world
            .sponsors
            .get_mut(&sponsor_id)
            .ok_or_else(|| ValidationError::UnknownSponsorOffer(sponsor_id.to_string()))?;
        if sponsor.is_signed() {
            return Err(ValidationError::SponsorAlreadySigned(sponsor.name.clone()));
        }
        sponsor.team = Some(self.player_team);
        sponsor.seasons_remaining = sponsor.terms.seasons;
        let bonus = sponsor.terms.signing_bonus;
        let name = sponsor.name.clone();

        let report = settle(
            &mut self
                .world
                .teams
                .get_mut(&self.player_team)
                .unwrap_or_else(|| InvariantViolation::raise("player team vanished from world"))
                .treasury,
            Settlement {
                sponsor_income: bonus,
                ..Settlement::default()
            },
            &self.config.economy,
        );
        log::info!("signed sponsor {name} for a {bonus} bonus");
        Ok(report)
    }

    /// Commit the player team to this week's race.
    ///
    /// # Errors
    ///
    /// Rejected when no race is scheduled this week, the roster has no active
    /// driver, or the garage has no car.
    pub fn enter_race(&mut self) -> Result<(), ValidationError> {
        if self.current_event().is_none() {
            return Err(ValidationError::NoRaceThisWeek(self.week));
        }
        if self.world.lead_driver(self.player_team).is_none() {
            return Err(ValidationError::EmptyRoster);
        }
        if self.world.lead_car(self.player_team).is_none() {
            return Err(ValidationError::NoCarAvailable);
        }
        self.entered_this_week = true;
        Ok(())
    }

    /// Advance the campaign by one week: run the scheduled race (if any),
    /// settle every team's ledger, and roll the season over after the final
    /// week. Exactly one week passes per call; nothing here blocks on I/O.
    ///
    /// # Errors
    ///
    /// Propagates internal validation failures; a correctly constructed
    /// session does not produce them.
    pub fn advance_week(&mut self) -> Result<WeekReport, ValidationError> {
        let race = if let Some(event) = self.current_event().cloned() {
            let conditions = self.roll_conditions(&event);
            let seed = self.rng.next_race_seed();
            let field = self.field_for_week();
            let result = {
                let entrants: Vec<Entrant<'_>> = field
                    .iter()
                    .map(|(driver, car)| Entrant {
                        driver: &self.world.drivers[driver],
                        car: &self.world.cars[car],
                    })
                    .collect();
                resolve_race(&entrants, &event, self.year, conditions, &self.config, seed)?
            };
            self.standings
                .apply_result(&mut self.world, &result, &self.config)?;
            Some(result)
        } else {
            None
        };

        let settlement = self.settle_week(race.as_ref());
        self.entered_this_week = false;
        self.pending_upgrade_spend = 0;
        self.pending_maintenance_spend = 0;

        let report_year = self.year;
        let report_week = self.week;
        let season_transition = if self.week >= self.config.calendar.weeks_per_year {
            let report = self.standings.close_season(&mut self.world, &self.config)?;
            self.year += 1;
            self.week = 1;
            self.calendar = generate_calendar(self.year, &self.config.calendar);
            self.standings = SeasonStandings::new(
                self.year,
                u32::try_from(self.calendar.len()).unwrap_or(u32::MAX),
            );
            Some(report)
        } else {
            self.week += 1;
            None
        };

        Ok(WeekReport {
            year: report_year,
            week: report_week,
            race,
            settlement,
            season_transition,
        })
    }

    fn roll_conditions(&self, event: &Event) -> Conditions {
        let wet = {
            let mut stream = self.rng.weather();
            stream.r#gen::<f64>() < self.config.race_day.wet_chance
        };
        let severity = if wet {
            self.config.race_day.base_severity + self.config.race_day.wet_severity_bonus
        } else {
            self.config.race_day.base_severity
        };
        Conditions {
            weather: if wet { Weather::Wet } else { Weather::Dry },
            severity,
            distance_factor: event.distance_factor,
            era_reliability: self.config.race_day.era_reliability,
        }
    }

    /// Every team fielding an active driver and a car; the player only when
    /// committed via `enter_race`.
    fn field_for_week(&self) -> Vec<(DriverId, CarId)> {
        let mut field = Vec::new();
        for team in self.world.teams.values() {
            if team.id == self.player_team && !self.entered_this_week {
                continue;
            }
            let Some(driver) = self.world.lead_driver(team.id) else {
                continue;
            };
            let Some(car) = self.world.lead_car(team.id) else {
                continue;
            };
            field.push((driver.id, car.id));
        }
        field
    }

    /// Weekly settlement pass over every team. Returns the player's report.
    fn settle_week(&mut self, race: Option<&RaceResult>) -> SettlementReport {
        let mut player_report = None;
        let team_ids: Vec<TeamId> = self.world.teams.keys().copied().collect();
        for team_id in team_ids {
            let wage_cost: i64 = self.world.teams[&team_id]
                .drivers
                .iter()
                .filter_map(|id| self.world.drivers.get(id))
                .filter_map(|d| d.contract.map(|c| c.wage))
                .sum();

            let classified = race.and_then(|result| {
                result.classification.iter().find(|c| c.team == team_id)
            });
            let prize_raw: i64 = race
                .map(|result| {
                    result
                        .classification
                        .iter()
                        .filter(|c| c.team == team_id)
                        .map(|c| c.prize)
                        .sum()
                })
                .unwrap_or(0);
            let prize_income = self.config.economy.constructor_cut(prize_raw)
                * self.market.purse_permille
                / 1_000;

            let mut sponsor_income = 0;
            if let Some(entry) = classified {
                let podium = entry.outcome.is_finish() && entry.position <= 3;
                for sponsor in self
                    .world
                    .sponsors
                    .values_mut()
                    .filter(|s| s.team == Some(team_id))
                {
                    sponsor_income += sponsor_race_payout(
                        sponsor,
                        entry.points,
                        podium,
                        self.market.sponsor_rate_permille,
                    );
                }
            }

            let (upgrade_spend, maintenance_spend) = if team_id == self.player_team {
                (self.pending_upgrade_spend, self.pending_maintenance_spend)
            } else {
                (0, 0)
            };

            let settlement = Settlement {
                prize_income,
                sponsor_income,
                wage_cost,
                running_cost: self.config.economy.weekly_running_cost,
                upgrade_spend,
                maintenance_spend,
            };
            if let Some(team) = self.world.teams.get_mut(&team_id) {
                let report = settle(&mut team.treasury, settlement, &self.config.economy);
                if team_id == self.player_team {
                    player_report = Some(report);
                }
            }
        }
        player_report
            .unwrap_or_else(|| InvariantViolation::raise("player team missing from settlement"))
    }

    /// Capture the full simulation state for persistence.
    #[must_use]
    pub fn snapshot(&self) -> crate::save::SaveGame {
        crate::save::SaveGame {
            version: crate::save::SAVE_VERSION,
            year: self.year,
            week: self.week,
            player_team: self.player_team,
            entered_this_week: self.entered_this_week,
            pending_upgrade_spend: self.pending_upgrade_spend,
            pending_maintenance_spend: self.pending_maintenance_spend,
            market: self.market,
            world: self.world.clone(),
            standings: self.standings.clone(),
            rng: self.rng.position(),
        }
    }

    /// Rebuild a session from a snapshot and the configuration it ran under.
    /// The calendar is regenerated deterministically from the saved year.
    ///
    /// # Panics
    ///
    /// Panics when the supplied configuration violates validation rules.
    #[must_use]
    pub fn restore(config: GameConfig, save: crate::save::SaveGame) -> Self {
        config.validate().expect("valid game config");
        let calendar = generate_calendar(save.year, &config.calendar);
        Self {
            config,
            world: save.world,
            standings: save.standings,
            calendar,
            year: save.year,
            week: save.week,
            player_team: save.player_team,
            entered_this_week: save.entered_this_week,
            pending_upgrade_spend: save.pending_upgrade_spend,
            pending_maintenance_spend: save.pending_maintenance_spend,
            market: save.market,
            rng: RngBundle::from_position(save.rng),
        }
    }
}
