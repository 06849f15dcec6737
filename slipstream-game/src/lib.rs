//! Slipstream Season Engine
//!
//! Platform-agnostic core logic for the Slipstream motorsport management
//! game: the race/season resolution engine, championship standings, season
//! progression, and the team economy ledger. This crate has no UI and no
//! I/O; presentation and persistence backends sit on the other side of the
//! snapshot and storage traits below.

pub mod calendar;
pub mod config;
pub mod economy;
pub mod entities;
pub mod error;
pub mod market;
pub mod numbers;
pub mod performance;
pub mod race;
pub mod reliability;
pub mod rng;
pub mod save;
pub mod session;
pub mod standings;

// Re-export commonly used types
pub use calendar::generate_calendar;
pub use config::{
    AgeBand, AgeCurve, AnchorEvent, CalendarConfig, ConfigError, CrashConfig, EconomyConfig,
    FailureCurve, FillerEvent, GameConfig, PaceModelConfig, PaceWeights, PointsTable, PurseConfig,
    RaceDayConfig, ReputationBand, ReputationConfig, RosterRules, SponsorCatalog, SponsorOffer,
    WearCarryover,
};
pub use economy::{
    Settlement, SettlementReport, SolvencyStatus, Treasury, settle, sponsor_race_payout,
};
pub use entities::{
    Car, CarComponent, CarId, CareerStats, Contract, Driver, DriverId, Event, SeasonRecord,
    SkillSet, Sponsor, SponsorId, SponsorTerms, Team, TeamId, World, entrant_key,
};
pub use error::{InsolvencyCondition, InvariantViolation, ValidationError};
pub use market::{MarketEvent, MarketEventSource, MarketState, StaticMarket};
pub use performance::{PaceSample, race_pace};
pub use race::{
    Checkpoint, Classification, ClassifiedEntrant, Conditions, Entrant, Outcome, RaceResult,
    RetirementReason, Weather, resolve_race,
};
pub use reliability::{failure_probability, per_checkpoint_probability};
pub use rng::{RngBundle, RngBundlePosition, StreamPosition, derive_stream_seed};
pub use save::{SAVE_VERSION, SaveGame};
pub use session::{Session, WeekReport};
pub use standings::{SeasonStandings, TransitionReport};

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a campaign snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_game(&self, save_name: &str, snapshot: &SaveGame) -> Result<(), Self::Error>;

    /// Load a campaign snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<SaveGame>, Self::Error>;

    /// Delete a saved campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, SaveGame>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn save_game(&self, save_name: &str, snapshot: &SaveGame) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), snapshot.clone());
            Ok(())
        }

        fn load_game(&self, save_name: &str) -> Result<Option<SaveGame>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    fn fixture_session(seed: u64) -> Session {
        let mut world = World::default();
        let player = world.add_team("Fenwick Racing", 400_000);
        let driver = world.add_driver("R. Calloway", 1922, SkillSet::new(65, 70, 60));
        world.drivers.get_mut(&driver).unwrap().contract = Some(Contract {
            team: player,
            wage: 5_000,
            seasons_remaining: 3,
        });
        world.teams.get_mut(&player).unwrap().drivers.push(driver);
        world.add_car(player, 60, 58, 80);
        Session::new(GameConfig::standard().clone(), world, player, 1947, seed).unwrap()
    }

    #[test]
    fn storage_roundtrips_snapshots() {
        let storage = MemoryStorage::default();
        let mut session = fixture_session(0xABCD);
        for _ in 0..5 {
            session.advance_week().unwrap();
        }

        storage.save_game("slot-one", &session.snapshot()).unwrap();
        let loaded = storage.load_game("slot-one").unwrap().expect("save exists");
        assert_eq!(loaded, session.snapshot());

        assert!(storage.load_game("missing-slot").unwrap().is_none());
        storage.delete_save("slot-one").unwrap();
        assert!(storage.load_game("slot-one").unwrap().is_none());
    }
}
