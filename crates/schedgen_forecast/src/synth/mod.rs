//! Record synthesis: reconciling concrete flights with integer targets.
//!
//! For each OD pair the record count is compared with the integer target:
//! - **target > base**: `min(target - base, cap)` clones are spread over the
//!   base records with [`choose_indices`], each clone time-shifted by
//!   [`RecordCloner`]
//! - **target < base**: `base - target` records are chosen with the same
//!   primitive and marked removed
//! - **target == base**: nothing happens and no draws are consumed
//!
//! Capped and unrealisable allocations are reported in
//! [`SynthesisOutcome::limited`], never raised as errors.

mod cloner;
mod selection;
mod synthesizer;

pub use cloner::{RecordCloner, CLONE_TAG_PREFIX};
pub use selection::choose_indices;
pub use synthesizer::{
    merge_schedule, AllocationLimit, CappedAllocation, RecordSynthesizer, SynthesisOutcome,
    DEFAULT_MAX_CLONES_PER_PAIR,
};
