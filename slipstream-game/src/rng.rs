//! Deterministic RNG plumbing for the campaign loop.
//!
//! Every stochastic domain draws from its own ChaCha stream, derived from the
//! campaign seed with an HMAC domain tag so streams never alias. Streams are
//! instrumented with draw counters and expose their exact word position, which
//! is what the save layer persists: a reloaded campaign resumes mid-stream
//! rather than replaying past draws.

use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Derive a per-domain stream seed from the campaign seed.
#[must_use]
pub fn derive_stream_seed(campaign_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&campaign_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// One seeded, position-trackable stream.
#[derive(Debug, Clone)]
pub struct RngStream {
    seed: u64,
    inner: CountingRng<ChaCha8Rng>,
}

impl RngStream {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: CountingRng {
                rng: ChaCha8Rng::seed_from_u64(seed),
                draws: 0,
            },
        }
    }

    /// Snapshot the stream position for persistence.
    #[must_use]
    pub fn position(&self) -> StreamPosition {
        StreamPosition {
            word_pos: self.inner.rng.get_word_pos(),
            draws: self.inner.draws,
        }
    }

    /// Rebuild a stream at a previously captured position.
    #[must_use]
    pub fn at_position(seed: u64, position: StreamPosition) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_word_pos(position.word_pos);
        Self {
            seed,
            inner: CountingRng {
                rng,
                draws: position.draws,
            },
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl std::ops::Deref for RngStream {
    type Target = CountingRng<ChaCha8Rng>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::ops::DerefMut for RngStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Exact resume point of one stream: keystream word offset plus draw count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreamPosition {
    pub word_pos: u128,
    pub draws: u64,
}

/// Serializable position of the whole bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngBundlePosition {
    pub campaign_seed: u64,
    pub race: StreamPosition,
    pub weather: StreamPosition,
}

/// Deterministic bundle of RNG streams segregated by simulation domain.
///
/// `race` feeds one fresh 64-bit seed to each race resolution; `weather`
/// decides race-day conditions. Both advance monotonically across the
/// campaign, so a past week's draws are never replayed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    campaign_seed: u64,
    race: RefCell<RngStream>,
    weather: RefCell<RngStream>,
}

impl RngBundle {
    /// Construct the bundle from the user-visible campaign seed.
    #[must_use]
    pub fn from_campaign_seed(seed: u64) -> Self {
        Self {
            campaign_seed: seed,
            race: RefCell::new(RngStream::new(derive_stream_seed(seed, b"race"))),
            weather: RefCell::new(RngStream::new(derive_stream_seed(seed, b"weather"))),
        }
    }

    /// Rebuild the bundle at a previously saved position.
    #[must_use]
    pub fn from_position(position: RngBundlePosition) -> Self {
        let seed = position.campaign_seed;
        Self {
            campaign_seed: seed,
            race: RefCell::new(RngStream::at_position(
                derive_stream_seed(seed, b"race"),
                position.race,
            )),
            weather: RefCell::new(RngStream::at_position(
                derive_stream_seed(seed, b"weather"),
                position.weather,
            )),
        }
    }

    #[must_use]
    pub const fn campaign_seed(&self) -> u64 {
        self.campaign_seed
    }

    /// Access the race-seed stream.
    #[must_use]
    pub fn race(&self) -> RefMut<'_, RngStream> {
        self.race.borrow_mut()
    }

    /// Access the weather stream.
    #[must_use]
    pub fn weather(&self) -> RefMut<'_, RngStream> {
        self.weather.borrow_mut()
    }

    /// Draw the seed for the next race resolution, advancing the race stream.
    #[must_use]
    pub fn next_race_seed(&self) -> u64 {
        self.race.borrow_mut().next_u64()
    }

    /// Snapshot all stream positions for persistence.
    #[must_use]
    pub fn position(&self) -> RngBundlePosition {
        RngBundlePosition {
            campaign_seed: self.campaign_seed,
            race: self.race.borrow().position(),
            weather: self.weather.borrow().position(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_tags_derive_distinct_seeds() {
        let seed = 0xFEED_CAFE_u64;
        assert_ne!(
            derive_stream_seed(seed, b"race"),
            derive_stream_seed(seed, b"weather"),
        );
    }

    #[test]
    fn counting_rng_tracks_draws() {
        let mut stream = RngStream::new(7);
        let _ = stream.next_u32();
        let _ = stream.next_u64();
        assert_eq!(stream.draws(), 2);
    }

    #[test]
    fn stream_resumes_at_saved_position() {
        let mut original = RngStream::new(99);
        for _ in 0..17 {
            let _ = original.next_u64();
        }
        let position = original.position();

        let mut resumed = RngStream::at_position(99, position);
        assert_eq!(resumed.draws(), original.draws());
        assert_eq!(resumed.next_u64(), original.next_u64());
    }

    #[test]
    fn bundle_roundtrips_through_position() {
        let bundle = RngBundle::from_campaign_seed(1234);
        let _ = bundle.next_race_seed();
        let _ = bundle.next_race_seed();
        let _ = bundle.weather().next_u32();

        let restored = RngBundle::from_position(bundle.position());
        assert_eq!(restored.next_race_seed(), bundle.next_race_seed());
        assert_eq!(
            restored.weather().next_u32(),
            bundle.weather().next_u32(),
        );
    }

    #[test]
    fn same_campaign_seed_reproduces_race_seeds() {
        let first = RngBundle::from_campaign_seed(42);
        let second = RngBundle::from_campaign_seed(42);
        assert_eq!(first.next_race_seed(), second.next_race_seed());
        assert_eq!(first.next_race_seed(), second.next_race_seed());
    }
}
