//! Combined pseudo-random stream with checkpoint/restore.
//!
//! This module provides [`StreamGenerator`], a thread-safe wrapper around a
//! three-word combined generator: a 64-bit linear congruential generator,
//! a 64-bit xorshift generator and a 32-bit multiply-with-carry generator,
//! mixed with XOR and addition as recommended in Numerical Recipes (3rd ed.,
//! `Ranq`/`Ran` family).

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::error::ConfigError;

/// Initial value of the xorshift word before seeding.
const XORSHIFT_INIT: u64 = 4_101_842_887_655_102_017;

/// LCG multiplier.
const LCG_MULTIPLIER: u64 = 2_862_933_555_777_941_757;

/// LCG increment.
const LCG_INCREMENT: u64 = 7_046_029_254_386_353_087;

/// Multiply-with-carry multiplier (base 2^32).
const MWC_MULTIPLIER: u64 = 4_294_957_665;

/// Added to a seed that leaves the xorshift or carry word at zero.
const RESEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed used by [`StreamGenerator::default`].
pub const DEFAULT_SEED: u64 = 123_456_789;

/// 2^-53, the spacing of doubles in [0.5, 1).
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Full internal state `(u, v, w)` of a [`StreamGenerator`].
///
/// `u` is the LCG word, `v` the xorshift word and `w` the multiply-with-carry
/// word. A valid state has nonzero `v` and `w`; both would otherwise stay
/// zero forever.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::rng::StreamGenerator;
///
/// let stream = StreamGenerator::new(42);
/// let snapshot = stream.state();
/// let first = stream.next_u64();
///
/// let replay = StreamGenerator::from_state(snapshot).unwrap();
/// assert_eq!(replay.next_u64(), first);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamState {
    /// Linear congruential word.
    pub u: u64,
    /// Xorshift word.
    pub v: u64,
    /// Multiply-with-carry word.
    pub w: u64,
}

impl StreamState {
    /// Derives the post-warm-up state for `seed`.
    ///
    /// The seed only positions the three words; the stream itself is defined
    /// by the state. Seeds that would leave `v` or `w` at zero are shifted by
    /// a fixed odd offset until they produce a valid state.
    pub fn from_seed(seed: u64) -> Self {
        let mut candidate = seed;
        loop {
            let state = Self::warm_up(candidate);
            if state.v != 0 && state.w != 0 {
                if candidate != seed {
                    debug!(seed, reseeded_with = candidate, "Adversarial stream seed re-seeded");
                }
                return state;
            }
            candidate = candidate.wrapping_add(RESEED_OFFSET);
        }
    }

    fn warm_up(seed: u64) -> Self {
        let mut state = Self {
            u: seed ^ XORSHIFT_INIT,
            v: XORSHIFT_INIT,
            w: 1,
        };
        state.step();
        state.v = state.u;
        state.step();
        state.w = state.v;
        state.step();
        state
    }

    /// Checks the nonzero-word invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStreamState`] if `v` or `w` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.v == 0 {
            return Err(ConfigError::InvalidStreamState {
                reason: "xorshift word v must be nonzero",
            });
        }
        if self.w == 0 {
            return Err(ConfigError::InvalidStreamState {
                reason: "multiply-with-carry word w must be nonzero",
            });
        }
        Ok(())
    }

    /// Advances all three generators and returns the combined output.
    #[inline]
    fn step(&mut self) -> u64 {
        self.u = self
            .u
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);

        self.v ^= self.v >> 17;
        self.v ^= self.v << 31;
        self.v ^= self.v >> 8;

        self.w = MWC_MULTIPLIER
            .wrapping_mul(self.w & 0xffff_ffff)
            .wrapping_add(self.w >> 32);

        let mut x = self.u ^ (self.u << 21);
        x ^= x >> 35;
        x ^= x << 4;

        x.wrapping_add(self.v) ^ self.w
    }
}

#[derive(Debug, Clone)]
struct StreamCursor {
    current: StreamState,
    saved: StreamState,
}

/// Deterministic, checkpointable 64-bit random stream.
///
/// All operations take `&self` and are serialised by an internal mutex, so
/// one stream may be shared between threads without observing a torn state.
/// Draws from a shared stream are still strictly sequential; independent
/// simulation instances should each own their own stream.
///
/// Cloning copies the current and checkpointed state; the clone is an
/// independent stream that replays the original's future.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::rng::StreamGenerator;
///
/// let stream = StreamGenerator::new(12345);
/// stream.next_u64();
/// stream.checkpoint();
///
/// let a: Vec<u64> = (0..3).map(|_| stream.next_u64()).collect();
/// stream.restore();
/// let b: Vec<u64> = (0..3).map(|_| stream.next_u64()).collect();
/// assert_eq!(a, b);
/// ```
#[derive(Debug)]
pub struct StreamGenerator {
    cursor: Mutex<StreamCursor>,
}

impl StreamGenerator {
    /// Creates a stream positioned by `seed`; the checkpoint is the seeded state.
    pub fn new(seed: u64) -> Self {
        let state = StreamState::from_seed(seed);
        Self {
            cursor: Mutex::new(StreamCursor {
                current: state,
                saved: state,
            }),
        }
    }

    /// Creates a stream from a previously captured snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStreamState`] if the snapshot has a zero
    /// `v` or `w` word.
    pub fn from_state(state: StreamState) -> Result<Self, ConfigError> {
        state.validate()?;
        Ok(Self {
            cursor: Mutex::new(StreamCursor {
                current: state,
                saved: state,
            }),
        })
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, StreamCursor> {
        // The cursor is plain data and is never left half-written.
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-initialises the stream from `seed` and checkpoints the result.
    ///
    /// Seeding twice with the same value leaves the stream in the same state
    /// regardless of draws made in between.
    pub fn seed(&self, seed: u64) {
        let state = StreamState::from_seed(seed);
        let mut cursor = self.lock();
        cursor.current = state;
        cursor.saved = state;
    }

    /// Returns the next full-range 64-bit value.
    #[inline]
    pub fn next_u64(&self) -> u64 {
        self.lock().current.step()
    }

    /// Returns the next value in `[0, 1)`, built from the top 53 bits of one
    /// 64-bit draw.
    #[inline]
    pub fn next_uniform(&self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIT_SCALE
    }

    /// Fills the buffer with values in `[0, 1)` under a single lock.
    pub fn fill_uniform(&self, buffer: &mut [f64]) {
        let mut cursor = self.lock();
        for value in buffer.iter_mut() {
            *value = (cursor.current.step() >> 11) as f64 * UNIT_SCALE;
        }
    }

    /// Saves the current state as the restore point and returns it.
    pub fn checkpoint(&self) -> StreamState {
        let mut cursor = self.lock();
        cursor.saved = cursor.current;
        cursor.saved
    }

    /// Rewinds the stream to the last checkpoint.
    pub fn restore(&self) {
        let mut cursor = self.lock();
        cursor.current = cursor.saved;
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> StreamState {
        self.lock().current
    }

    /// Returns the last checkpointed state.
    pub fn checkpointed_state(&self) -> StreamState {
        self.lock().saved
    }

    /// Overwrites the current state; the checkpoint is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStreamState`] if the snapshot has a zero
    /// `v` or `w` word; the stream is unchanged in that case.
    pub fn set_state(&self, state: StreamState) -> Result<(), ConfigError> {
        state.validate()?;
        self.lock().current = state;
        Ok(())
    }
}

impl Default for StreamGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl Clone for StreamGenerator {
    fn clone(&self) -> Self {
        let cursor = self.lock().clone();
        Self {
            cursor: Mutex::new(cursor),
        }
    }
}

impl RngCore for StreamGenerator {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64_exclusive() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.next_u64_exclusive()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64_exclusive().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl StreamGenerator {
    /// Exclusive access needs no locking.
    #[inline]
    fn next_u64_exclusive(&mut self) -> u64 {
        self.cursor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .step()
    }
}

impl SeedableRng for StreamGenerator {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
