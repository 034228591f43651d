//! # Reproducible Random Streams
//!
//! This module provides the single source of randomness for schedule
//! synthesis: [`StreamGenerator`], a combined LCG/xorshift/multiply-with-carry
//! generator with seed, checkpoint and restore.
//!
//! ## Design Rationale
//!
//! - **Reproducibility**: a seed fully determines the stream; a
//!   [`StreamState`] snapshot fully determines the remainder of it
//! - **Replay**: `checkpoint()`/`restore()` rewind to a known point without
//!   re-seeding
//! - **Sharing**: all operations take `&self` behind one mutex; concurrent
//!   callers see a consistent, strictly sequential stream
//! - **Ecosystem**: implements `rand::RngCore` and `rand::SeedableRng`
//!
//! ## Usage Example
//!
//! ```rust
//! use schedgen_core::rng::StreamGenerator;
//!
//! let stream = StreamGenerator::new(5);
//! let u = stream.next_uniform();
//! assert!((0.0..1.0).contains(&u));
//!
//! // Same seed, same sequence
//! stream.seed(5);
//! assert_eq!(stream.next_uniform(), u);
//! ```

mod stream;

pub use stream::{StreamGenerator, StreamState, DEFAULT_SEED};
