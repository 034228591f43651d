//! Choose-k-of-n index selection.
//!
//! Shared by clone distribution and removal: every one of the `n`
//! candidates first receives `k / n`, then the remaining `k % n` units go to
//! an unbiased subset drawn without replacement by a single ordered scan
//! (selection sampling, Knuth TAOCP vol. 2, Algorithm S).

use schedgen_core::rng::StreamGenerator;

/// Distributes `k` units over `n` candidates as evenly as possible.
///
/// Returns `n` counts summing to `k`, each either `k / n` or `k / n + 1`.
/// Candidate `i` receives an extra unit with probability `(k % n) / n`,
/// and the extra units form a uniformly random subset.
///
/// Draws are consumed only while a choice is genuinely random: none when
/// `k % n == 0`, and none once the remaining candidates must all be
/// selected. Returns an empty vector when `n == 0`.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::rng::StreamGenerator;
/// use schedgen_forecast::synth::choose_indices;
///
/// let stream = StreamGenerator::new(9);
/// let counts = choose_indices(7, 3, &stream);
/// assert_eq!(counts.iter().sum::<usize>(), 7);
/// assert!(counts.iter().all(|&c| c == 2 || c == 3));
/// ```
pub fn choose_indices(k: usize, n: usize, stream: &StreamGenerator) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }

    let mut counts = vec![k / n; n];
    let mut left = k % n;

    for (i, count) in counts.iter_mut().enumerate() {
        if left == 0 {
            break;
        }
        let remaining = n - i;
        if remaining <= left || (remaining as f64) * stream.next_uniform() < left as f64 {
            *count += 1;
            left -= 1;
        }
    }
    counts
}
