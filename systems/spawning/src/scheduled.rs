//! Time-driven spawner that places a new city whenever its threshold elapses.

use std::time::Duration;

use rand::Rng;
use traffic_manager_core::{AssetCatalog, CellIndex, FootprintId, GridDimensions, RenderSink};
use traffic_manager_system_placement::{emit_footprint, select_cell, OccupiedSet};

use crate::{policy::BuildTimePolicy, SpawnFrame, SpawnStrategy};

/// Accumulated timing state of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnState {
    elapsed: Duration,
    threshold: Duration,
    built: u32,
}

impl SpawnState {
    /// Time accumulated since the previous spawn.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time that must accumulate before the next spawn.
    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Number of cities spawned so far.
    #[must_use]
    pub const fn built(&self) -> u32 {
        self.built
    }
}

/// Outcome of a tick that produced a city.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnReport {
    /// Grid cell that received the city.
    pub cell: CellIndex,
    /// Catalog index of the layout drawn for the city.
    pub variant: usize,
    /// Identifier shared by the city's drawables.
    pub footprint: FootprintId,
    /// Waiting time sampled for the following city.
    pub next_threshold: Duration,
}

/// Spawner that places cities on a schedule governed by a [`BuildTimePolicy`].
///
/// The scheduler owns its occupied set, timing state and random source.
/// Given the same seed, policy and sequence of frame deltas it emits the
/// same cities in the same order.
#[derive(Debug)]
pub struct ScheduledSpawner<R> {
    catalog: AssetCatalog,
    grid: GridDimensions,
    policy: BuildTimePolicy,
    occupied: OccupiedSet,
    state: SpawnState,
    next_footprint: FootprintId,
    rng: R,
}

impl<R> ScheduledSpawner<R>
where
    R: Rng,
{
    /// Creates a scheduler and samples its first threshold for zero built cities.
    pub fn new(
        catalog: AssetCatalog,
        grid: GridDimensions,
        policy: BuildTimePolicy,
        mut rng: R,
    ) -> Self {
        let threshold = policy.sample(0, &mut rng);
        Self {
            catalog,
            grid,
            policy,
            occupied: OccupiedSet::new(),
            state: SpawnState {
                elapsed: Duration::ZERO,
                threshold,
                built: 0,
            },
            next_footprint: FootprintId::new(0),
            rng,
        }
    }

    /// Overrides the waiting time required before the next spawn.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.state.threshold = threshold;
        self
    }

    /// Current timing state.
    #[must_use]
    pub const fn state(&self) -> &SpawnState {
        &self.state
    }

    /// Cells handed out so far.
    #[must_use]
    pub const fn occupied(&self) -> &OccupiedSet {
        &self.occupied
    }

    /// Advances the scheduler by `dt`, spawning at most one city into `sink`.
    pub fn tick(&mut self, dt: Duration, sink: &mut dyn RenderSink) -> Option<SpawnReport> {
        self.state.elapsed = self.state.elapsed.saturating_add(dt);
        if self.state.elapsed < self.state.threshold {
            return None;
        }

        let distinct_before = self.occupied.distinct_len();
        let cell = select_cell(&mut self.occupied, self.grid, &mut self.rng);
        let variant = self.rng.gen_range(0..self.catalog.variant_count());
        let footprint = self.next_footprint;
        self.next_footprint = footprint.next();

        if let (Some(coord), Some(layout)) =
            (self.grid.coord_of(cell), self.catalog.variant(variant))
        {
            let _ = emit_footprint(sink, coord, layout, footprint);
        }

        let next_threshold = self.policy.sample(self.state.built, &mut self.rng);
        self.state.elapsed = Duration::ZERO;
        self.state.threshold = next_threshold;
        self.state.built = self.state.built.saturating_add(1);

        tracing::debug!(
            cell = cell.get(),
            variant,
            built = self.state.built,
            next_threshold_ms = next_threshold.as_millis() as u64,
            "city spawned"
        );
        if self.occupied.distinct_len() == distinct_before {
            tracing::trace!(cell = cell.get(), "grid saturated, city overlaps an existing one");
        }

        Some(SpawnReport {
            cell,
            variant,
            footprint,
            next_threshold,
        })
    }
}

impl<R> SpawnStrategy for ScheduledSpawner<R>
where
    R: Rng,
{
    fn on_frame(&mut self, frame: &SpawnFrame, sink: &mut dyn RenderSink) -> usize {
        usize::from(self.tick(frame.dt, sink).is_some())
    }

    fn cities_built(&self) -> u32 {
        self.state.built
    }
}
