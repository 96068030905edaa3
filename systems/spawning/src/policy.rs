//! Build-time policy deciding how long the scheduler waits between cities.

use std::time::Duration;

use rand::Rng;

/// Half-open range of waiting times, inclusive of `min` and exclusive of `max`.
///
/// Stored at millisecond resolution so sampled values never round onto the
/// exclusive bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThresholdRange {
    min_millis: u64,
    max_millis: u64,
}

impl ThresholdRange {
    /// Creates a range from whole seconds. Returns `None` when the range is empty.
    #[must_use]
    pub const fn from_secs(min: u64, max: u64) -> Option<Self> {
        Self::from_millis(min * 1_000, max * 1_000)
    }

    /// Creates a range from milliseconds. Returns `None` when the range is empty.
    #[must_use]
    pub const fn from_millis(min_millis: u64, max_millis: u64) -> Option<Self> {
        if min_millis >= max_millis {
            return None;
        }
        Some(Self {
            min_millis,
            max_millis,
        })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn min(&self) -> Duration {
        Duration::from_millis(self.min_millis)
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max_millis)
    }

    /// Reports whether the duration lies inside the range.
    #[must_use]
    pub fn contains(&self, value: Duration) -> bool {
        value >= self.min() && value < self.max()
    }

    /// Draws a fresh waiting time uniformly from the range.
    pub fn sample<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        Duration::from_millis(rng.gen_range(self.min_millis..self.max_millis))
    }
}

/// Waiting-time range applied while fewer than `built_below` cities exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildTimeBracket {
    /// Exclusive upper bound on the built count covered by the bracket.
    pub built_below: u32,
    /// Waiting time drawn while the bracket applies.
    pub range: ThresholdRange,
}

impl BuildTimeBracket {
    /// Creates a bracket covering built counts below `built_below`.
    #[must_use]
    pub const fn new(built_below: u32, range: ThresholdRange) -> Self {
        Self { built_below, range }
    }
}

const fn secs(min: u64, max: u64) -> ThresholdRange {
    match ThresholdRange::from_secs(min, max) {
        Some(range) => range,
        None => panic!("reference build-time ranges are non-empty"),
    }
}

const REFERENCE_BRACKETS: [BuildTimeBracket; 5] = [
    BuildTimeBracket::new(2, secs(10, 15)),
    BuildTimeBracket::new(5, secs(60, 90)),
    BuildTimeBracket::new(10, secs(30, 90)),
    BuildTimeBracket::new(20, secs(30, 65)),
    BuildTimeBracket::new(25, secs(30, 60)),
];

const REFERENCE_STEADY: ThresholdRange = secs(20, 40);

/// Table mapping the number of built cities to the next waiting-time range.
///
/// The reference table is not monotonic. The first two cities arrive quickly,
/// the next three slowly, and from the 25th city on the waiting time settles
/// into a narrow band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTimePolicy {
    brackets: Vec<BuildTimeBracket>,
    steady: ThresholdRange,
}

impl BuildTimePolicy {
    /// Creates a policy from brackets ordered by strictly increasing `built_below`,
    /// followed by the range used once every bracket has been outgrown.
    #[must_use]
    pub fn new(brackets: Vec<BuildTimeBracket>, steady: ThresholdRange) -> Option<Self> {
        let ordered = brackets
            .windows(2)
            .all(|pair| pair[0].built_below < pair[1].built_below);
        if !ordered {
            return None;
        }
        Some(Self { brackets, steady })
    }

    /// Policy applying the same range regardless of how many cities exist.
    #[must_use]
    pub fn constant(range: ThresholdRange) -> Self {
        Self {
            brackets: Vec::new(),
            steady: range,
        }
    }

    /// Reference pacing table.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            brackets: REFERENCE_BRACKETS.to_vec(),
            steady: REFERENCE_STEADY,
        }
    }

    /// Range consulted when `built` cities exist.
    #[must_use]
    pub fn range_for(&self, built: u32) -> ThresholdRange {
        self.brackets
            .iter()
            .find(|bracket| built < bracket.built_below)
            .map_or(self.steady, |bracket| bracket.range)
    }

    /// Draws a fresh waiting time for the next city given `built` existing cities.
    pub fn sample<R>(&self, built: u32, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        self.range_for(built).sample(rng)
    }
}

impl Default for BuildTimePolicy {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ranges_are_rejected() {
        assert!(ThresholdRange::from_secs(5, 5).is_none());
        assert!(ThresholdRange::from_millis(10, 1).is_none());
    }

    #[test]
    fn reference_brackets_match_pacing_table() {
        let policy = BuildTimePolicy::reference();
        let expected = [
            (0, (10, 15)),
            (1, (10, 15)),
            (2, (60, 90)),
            (4, (60, 90)),
            (5, (30, 90)),
            (9, (30, 90)),
            (10, (30, 65)),
            (19, (30, 65)),
            (20, (30, 60)),
            (24, (30, 60)),
            (25, (20, 40)),
            (u32::MAX, (20, 40)),
        ];

        for (built, (min, max)) in expected {
            let range = policy.range_for(built);
            assert_eq!(range.min(), Duration::from_secs(min), "built = {built}");
            assert_eq!(range.max(), Duration::from_secs(max), "built = {built}");
        }
    }

    #[test]
    fn unordered_brackets_are_rejected() {
        let range = secs(1, 2);
        let brackets = vec![BuildTimeBracket::new(5, range), BuildTimeBracket::new(5, range)];
        assert!(BuildTimePolicy::new(brackets, range).is_none());
    }

    #[test]
    fn range_contains_is_half_open() {
        let range = secs(10, 15);
        assert!(range.contains(Duration::from_secs(10)));
        assert!(range.contains(Duration::from_millis(14_999)));
        assert!(!range.contains(Duration::from_secs(15)));
    }
}
