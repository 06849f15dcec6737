//! Pluggable dynamic-world hook.
//!
//! The engine does not guess market mechanics: an external source feeds
//! discrete [`MarketEvent`] adjustments into the economy's rate tables, and
//! the default source feeds nothing.

use serde::{Deserialize, Serialize};

/// Bounds for the market rate multipliers, in permille of neutral terms.
const RATE_PERMILLE_MIN: i64 = 250;
const RATE_PERMILLE_MAX: i64 = 4_000;

/// One discrete market movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketEvent {
    /// Sponsorship market shifts; scales recurring sponsor payments.
    SponsorRateShift { permille_delta: i64 },
    /// Prize money market shifts; scales the constructor's prize income.
    PurseShift { permille_delta: i64 },
}

/// Source of market events, polled once per simulated week.
pub trait MarketEventSource {
    fn events_for_week(&mut self, year: u32, week: u32) -> Vec<MarketEvent>;
}

/// The default market: nothing ever moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMarket;

impl MarketEventSource for StaticMarket {
    fn events_for_week(&mut self, _year: u32, _week: u32) -> Vec<MarketEvent> {
        Vec::new()
    }
}

/// Current market multipliers carried by the simulation, permille of neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub sponsor_rate_permille: i64,
    pub purse_permille: i64,
}

impl MarketState {
    /// Fold one event into the rates, clamped to the sane band.
    pub fn apply(&mut self, event: MarketEvent) {
        match event {
            MarketEvent::SponsorRateShift { permille_delta } => {
                self.sponsor_rate_permille = (self.sponsor_rate_permille + permille_delta)
                    .clamp(RATE_PERMILLE_MIN, RATE_PERMILLE_MAX);
            }
            MarketEvent::PurseShift { permille_delta } => {
                self.purse_permille = (self.purse_permille + permille_delta)
                    .clamp(RATE_PERMILLE_MIN, RATE_PERMILLE_MAX);
            }
        }
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            sponsor_rate_permille: 1_000,
            purse_permille: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_market_emits_nothing() {
        let mut market = StaticMarket;
        assert!(market.events_for_week(1947, 20).is_empty());
    }

    #[test]
    fn market_state_clamps_to_band() {
        let mut state = MarketState::default();
        state.apply(MarketEvent::SponsorRateShift {
            permille_delta: 10_000,
        });
        assert_eq!(state.sponsor_rate_permille, RATE_PERMILLE_MAX);

        state.apply(MarketEvent::PurseShift {
            permille_delta: -10_000,
        });
        assert_eq!(state.purse_permille, RATE_PERMILLE_MIN);
    }

    #[test]
    fn deltas_accumulate() {
        let mut state = MarketState::default();
        state.apply(MarketEvent::SponsorRateShift { permille_delta: 100 });
        state.apply(MarketEvent::SponsorRateShift { permille_delta: -50 });
        assert_eq!(state.sponsor_rate_permille, 1_050);
    }
}
