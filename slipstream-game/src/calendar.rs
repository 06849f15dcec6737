//! Deterministic season calendar generation.
//!
//! Anchor events keep their week every year; filler events are placed inside
//! their configured windows by a ChaCha stream seeded from the year, so the
//! same year always produces the same calendar without any global state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::config::{CalendarConfig, FillerEvent};
use crate::entities::Event;
use crate::rng::derive_stream_seed;

/// Build the season calendar for a given year, ordered by week.
#[must_use]
pub fn generate_calendar(year: u32, cfg: &CalendarConfig) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(u64::from(year), b"calendar"));
    let mut by_week: BTreeMap<u32, Event> = BTreeMap::new();

    for anchor in &cfg.anchors {
        by_week.insert(
            anchor.week,
            Event {
                name: anchor.name.clone(),
                location: anchor.location.clone(),
                week: anchor.week,
                prestige: anchor.prestige,
                distance_factor: anchor.distance_factor,
            },
        );
    }

    for filler in &cfg.fillers {
        for _ in 0..filler.count {
            match place_filler(filler, &by_week, cfg, &mut rng) {
                Some(week) => {
                    by_week.insert(
                        week,
                        Event {
                            name: filler.name.clone(),
                            location: filler.location.clone(),
                            week,
                            prestige: filler.prestige,
                            distance_factor: filler.distance_factor,
                        },
                    );
                }
                None => {
                    log::debug!(
                        "calendar {year}: no week left for '{}' in {}..={}",
                        filler.name,
                        filler.window_start,
                        filler.window_end
                    );
                }
            }
        }
    }

    by_week.into_values().collect()
}

/// Pick a week for one filler instance: first try weeks honoring the minimum
/// gap, then fall back to any free week in the window.
fn place_filler<R: Rng>(
    filler: &FillerEvent,
    taken: &BTreeMap<u32, Event>,
    cfg: &CalendarConfig,
    rng: &mut R,
) -> Option<u32> {
    let window = filler.window_start.max(1)..=filler.window_end.min(cfg.weeks_per_year);
    let free: Vec<u32> = window.filter(|week| !taken.contains_key(week)).collect();
    if free.is_empty() {
        return None;
    }

    let spaced: Vec<u32> = free
        .iter()
        .copied()
        .filter(|&week| {
            taken
                .keys()
                .all(|&existing| week.abs_diff(existing) >= cfg.min_gap)
        })
        .collect();

    let pool = if spaced.is_empty() { &free } else { &spaced };
    pool.get(rng.gen_range(0..pool.len())).copied()
}
