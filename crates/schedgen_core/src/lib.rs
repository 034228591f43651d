//! # schedgen_core: Stochastic Foundation for Flight Schedule Synthesis
//!
//! ## Layer 1 (Foundation) Role
//!
//! schedgen_core serves as the bottom layer of the schedule generator, providing:
//! - A deterministic, checkpointable combined random stream (`rng`)
//! - Inverse-CDF univariate sampling: uniform, normal, triangular (`distributions`)
//! - Covariance/Cholesky types and correlated vector sampling (`correlation`)
//! - The configuration error type shared by all constructors (`error`)
//!
//! ## Reproducibility Principle
//!
//! Every sample drawn by this crate is a pure function of the stream seed
//! (or a restored stream snapshot) and the construction parameters. No
//! operation reads ambient entropy, wall-clock time or thread identity.
//!
//! ## Minimal Dependencies
//!
//! Layer 1 knows nothing about flights or airports:
//! - num-traits: Generic floating-point matrix code
//! - rand: `RngCore`/`SeedableRng` integration for the stream generator
//! - thiserror: Configuration error derivation
//! - tracing: Diagnostic events (re-seeding, degraded sampling)
//! - serde: Stream snapshot serialisation (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use schedgen_core::correlation::{CorrelatedSampler, CorrelationMatrix};
//! use schedgen_core::distributions::{DistributionSpec, UnivariateSampler};
//! use schedgen_core::rng::StreamGenerator;
//!
//! let stream = StreamGenerator::new(5);
//!
//! // Univariate inverse-CDF sampling
//! let normal = DistributionSpec::normal(500.0, 5.0).unwrap();
//! let x = normal.sample(&stream);
//! assert!(x.is_finite());
//!
//! // Correlated standard normals
//! let corr = CorrelationMatrix::new(&[1.0, 0.5, 0.5, 1.0], 2).unwrap();
//! let sampler = CorrelatedSampler::standard(&corr);
//! assert!(sampler.is_positive_definite());
//! assert_eq!(sampler.next_vector(&stream).len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for `StreamState` snapshots

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod correlation;
pub mod distributions;
pub mod error;
pub mod rng;

pub use error::ConfigError;
