#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system responsible for deciding when and where cities appear.
//!
//! Two interchangeable strategies exist. [`ScheduledSpawner`] places cities
//! on a timer whose length depends on how many cities already exist, while
//! [`ManualSpawner`] places one city under the pointer per trigger press.
//! Drivers pick one at setup through [`build_strategy`] and feed it one
//! [`SpawnFrame`] per simulation frame.

mod manual;
mod policy;
mod scheduled;

use std::{fmt, str::FromStr, time::Duration};

use rand::Rng;
use thiserror::Error;
use traffic_manager_core::{AssetCatalog, ButtonState, GridDimensions, PointerPosition, RenderSink};

pub use self::{
    manual::ManualSpawner,
    policy::{BuildTimeBracket, BuildTimePolicy, ThresholdRange},
    scheduled::{ScheduledSpawner, SpawnReport, SpawnState},
};

/// Per-frame observations handed to a spawn strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpawnFrame {
    /// Simulated time elapsed since the previous frame.
    pub dt: Duration,
    /// Edge-aware state of the build trigger.
    pub trigger: ButtonState,
    /// Most recent pointer position, if one has been observed.
    pub pointer: Option<PointerPosition>,
}

impl SpawnFrame {
    /// Creates a frame that only advances time.
    #[must_use]
    pub const fn tick(dt: Duration) -> Self {
        Self {
            dt,
            trigger: ButtonState::Released,
            pointer: None,
        }
    }
}

/// Policy that turns frames into city placements.
pub trait SpawnStrategy {
    /// Processes a single frame, adding any new city drawables to `sink`.
    ///
    /// Returns the number of cities placed during the frame.
    fn on_frame(&mut self, frame: &SpawnFrame, sink: &mut dyn RenderSink) -> usize;

    /// Total number of cities placed so far. Never decreases.
    fn cities_built(&self) -> u32;
}

/// Selects which spawn strategy the driver composes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpawnMode {
    /// Cities appear on a timer at random free cells.
    #[default]
    Scheduled,
    /// Cities appear under the pointer when the build trigger is pressed.
    Manual,
}

impl SpawnMode {
    /// Lower-case name used on the command line and in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for SpawnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a spawn mode name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown spawn mode `{0}`; expected `scheduled` or `manual`")]
pub struct ParseSpawnModeError(String);

impl FromStr for SpawnMode {
    type Err = ParseSpawnModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "manual" => Ok(Self::Manual),
            _ => Err(ParseSpawnModeError(value.to_owned())),
        }
    }
}

/// Composes the strategy selected by `mode`.
///
/// The catalog and random source are only consumed by the scheduled strategy;
/// the manual strategy reads the catalog's fallback footprint.
pub fn build_strategy<R>(
    mode: SpawnMode,
    catalog: AssetCatalog,
    grid: GridDimensions,
    rng: R,
) -> Box<dyn SpawnStrategy>
where
    R: Rng + 'static,
{
    match mode {
        SpawnMode::Scheduled => Box::new(ScheduledSpawner::new(
            catalog,
            grid,
            BuildTimePolicy::reference(),
            rng,
        )),
        SpawnMode::Manual => Box::new(ManualSpawner::new(&catalog)),
    }
}
