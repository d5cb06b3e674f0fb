// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Even, deterministic down-sampling of a transcript for the timeline chart.

/// Fewest timeline points produced once a transcript is long enough.
pub const TIMELINE_MIN: usize = 60;

/// Hard cap on timeline points, for both engines.
pub const TIMELINE_MAX: usize = 220;

/// Preferred number of timeline points.
pub const TIMELINE_SOFT_TARGET: usize = 120;

/// Picks up to `target` strictly increasing indices in `[0, n)`.
///
/// When `n <= target` every index is returned. Otherwise indices are taken
/// at an even real-valued step of `n / target`, the last one is pinned to
/// `n - 1`, and collisions are removed, so the result may be shorter than
/// `target`.
pub fn sample(n: usize, target: usize) -> Vec<usize> {
    if n <= target {
        return (0..n).collect();
    }
    if target == 0 {
        return Vec::new();
    }

    let step = n as f64 / target as f64;
    let mut picks: Vec<usize> = (0..target)
        .map(|i| (i as f64 * step).floor() as usize)
        .collect();

    // Floating-point undershoot must not drop the final message.
    if let Some(last) = picks.last_mut() {
        *last = n - 1;
    }

    picks.sort_unstable();
    picks.dedup();
    picks
}

/// Number of timeline points to aim for given `n` messages.
///
/// Clamps the soft target into `[TIMELINE_MIN, min(TIMELINE_MAX, n)]`;
/// short transcripts below the minimum use every message.
pub fn timeline_target(n: usize) -> usize {
    let upper = n.min(TIMELINE_MAX);
    if upper < TIMELINE_MIN {
        upper
    } else {
        TIMELINE_SOFT_TARGET.clamp(TIMELINE_MIN, upper)
    }
}
