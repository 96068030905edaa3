#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Traffic Manager city spawner.
//!
//! Settings come from an optional TOML file overlaid with command-line flags.
//! The selected spawn strategy is then driven either by the macroquad window
//! or, with `--headless-seconds`, by a fixed-rate loop that never opens one.

mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use traffic_manager_core::{AssetCatalog, DrawCommand, GridDimensions};
use traffic_manager_rendering::{
    Color, HudPresentation, Presentation, RenderingBackend, Scene, TerrainPresentation,
};
use traffic_manager_rendering_macroquad::MacroquadBackend;
use traffic_manager_system_spawning::{build_strategy, SpawnFrame, SpawnMode, SpawnStrategy};

use crate::config::Settings;

/// Log directive used when `RUST_LOG` is unset.
const DEFAULT_LOG_DIRECTIVE: &str = "traffic_manager=info";

/// Command-line arguments accepted by the Traffic Manager binary.
#[derive(Debug, Parser)]
#[command(name = "traffic-manager", version, about = "Spawns cities across a tiled map")]
struct CliArgs {
    /// Spawn strategy to run (`scheduled` or `manual`).
    #[arg(long)]
    mode: Option<SpawnMode>,
    /// Seed for the placement random source. Drawn from entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Configuration file to read instead of `traffic.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Synchronise presentation with the display refresh rate.
    #[arg(
        long,
        value_name = "on|off",
        default_value = "on",
        action = clap::ArgAction::Set,
        value_parser = parse_toggle
    )]
    vsync: bool,
    /// Log the measured frame rate once per second.
    #[arg(long)]
    show_fps: bool,
    /// Simulate this many seconds without opening a window, then print a summary.
    #[arg(long, value_name = "SECONDS")]
    headless_seconds: Option<f32>,
    /// Simulation frames per second used by the headless run.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    frame_rate: u32,
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(format!("expected `on` or `off`, received `{value}`")),
    }
}

/// Entry point for the Traffic Manager command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let settings =
        Settings::load(args.config.as_deref()).context("failed to load configuration")?;

    let mode = args.mode.unwrap_or(settings.mode);
    let seed = args.seed.or(settings.seed).unwrap_or_else(rand::random);
    tracing::info!(%mode, seed, "starting traffic manager");

    let strategy = build_strategy(
        mode,
        AssetCatalog::reference(),
        GridDimensions::reference(),
        ChaCha8Rng::seed_from_u64(seed),
    );

    match args.headless_seconds {
        Some(seconds) => {
            let duration = headless_duration(seconds)?;
            let summary = run_headless(strategy, duration, args.frame_rate);
            println!(
                "mode: {mode}\nseed: {seed}\nframes: {}\ncities built: {}\ndrawables: {}",
                summary.frames, summary.cities_built, summary.drawables
            );
            Ok(())
        }
        None => run_windowed(strategy, mode, settings, &args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Converts the `--headless-seconds` value into simulated time.
fn headless_duration(seconds: f32) -> Result<Duration> {
    ensure!(
        seconds >= 0.0,
        "--headless-seconds must not be negative (received {seconds})"
    );
    Duration::try_from_secs_f32(seconds)
        .with_context(|| format!("--headless-seconds value {seconds} is out of range"))
}

/// Outcome of a headless simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HeadlessSummary {
    frames: u64,
    cities_built: u32,
    drawables: usize,
}

/// Drives `strategy` at a fixed frame rate for `duration` of simulated time.
fn run_headless(
    mut strategy: Box<dyn SpawnStrategy>,
    duration: Duration,
    frame_rate: u32,
) -> HeadlessSummary {
    let frame_rate = frame_rate.max(1);
    let dt = Duration::from_secs(1) / frame_rate;
    let frames = (duration.as_secs_f64() * f64::from(frame_rate)).ceil() as u64;

    let mut sink: Vec<DrawCommand> = Vec::new();
    for _ in 0..frames {
        let _ = strategy.on_frame(&SpawnFrame::tick(dt), &mut sink);
    }

    HeadlessSummary {
        frames,
        cities_built: strategy.cities_built(),
        drawables: sink.len(),
    }
}

fn run_windowed(
    mut strategy: Box<dyn SpawnStrategy>,
    mode: SpawnMode,
    settings: Settings,
    args: &CliArgs,
) -> Result<()> {
    let Settings { window, assets, .. } = settings;

    let mut hud = HudPresentation::for_window(window.width as f32, window.height as f32)
        .context("invalid window size")?;
    hud.label = hud_label(mode, 0);
    let scene = Scene::new(TerrainPresentation::reference(), hud);
    let presentation = Presentation::new(
        window.title,
        window.width,
        window.height,
        Color::WHITE,
        scene,
    );

    let backend = MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .with_assets(assets);

    let mut last_reported = 0;
    backend.run(presentation, move |dt, input, scene| {
        let frame = SpawnFrame {
            dt,
            trigger: input.build_trigger,
            pointer: input.pointer(),
        };
        let _ = strategy.on_frame(&frame, scene);

        let built = strategy.cities_built();
        if built != last_reported {
            scene.hud.label = hud_label(mode, built);
            last_reported = built;
        }
    })
}

/// Text shown in the HUD panel.
fn hud_label(mode: SpawnMode, cities_built: u32) -> String {
    let hint = match mode {
        SpawnMode::Scheduled => "Cities appear on their own",
        SpawnMode::Manual => "Press F1 to build under the cursor",
    };
    format!("Cities built: {cities_built}\nMode: {mode}\n{hint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(seed: u64) -> Box<dyn SpawnStrategy> {
        build_strategy(
            SpawnMode::Scheduled,
            AssetCatalog::reference(),
            GridDimensions::reference(),
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    #[test]
    fn arguments_default_to_file_settings() {
        let args = CliArgs::try_parse_from(["traffic-manager"]).expect("no flags is valid");
        assert_eq!(args.mode, None);
        assert_eq!(args.seed, None);
        assert!(args.vsync);
        assert_eq!(args.frame_rate, 60);
    }

    #[test]
    fn arguments_parse_mode_and_toggles() {
        let args = CliArgs::try_parse_from([
            "traffic-manager",
            "--mode",
            "Manual",
            "--seed",
            "9",
            "--vsync",
            "off",
            "--headless-seconds",
            "2.5",
        ])
        .expect("flags should parse");

        assert_eq!(args.mode, Some(SpawnMode::Manual));
        assert_eq!(args.seed, Some(9));
        assert!(!args.vsync);
        assert_eq!(args.headless_seconds, Some(2.5));
    }

    #[test]
    fn zero_frame_rate_is_rejected() {
        assert!(CliArgs::try_parse_from(["traffic-manager", "--frame-rate", "0"]).is_err());
        assert!(CliArgs::try_parse_from(["traffic-manager", "--mode", "timed"]).is_err());
    }

    #[test]
    fn headless_duration_rejects_values_outside_duration_range() {
        assert_eq!(headless_duration(2.5).expect("valid"), Duration::from_millis(2_500));
        assert_eq!(headless_duration(0.0).expect("valid"), Duration::ZERO);
        assert!(headless_duration(-1.0).is_err());
        assert!(headless_duration(1e30).is_err());
        assert!(headless_duration(f32::INFINITY).is_err());
        assert!(headless_duration(f32::NAN).is_err());
    }

    #[test]
    fn headless_run_builds_first_city_within_bracket() {
        // The first threshold lies in [10s, 15s).
        let early = run_headless(scheduled(3), Duration::from_secs(9), 60);
        assert_eq!(early.cities_built, 0);
        assert_eq!(early.drawables, 0);

        let later = run_headless(scheduled(3), Duration::from_secs(16), 60);
        assert!(later.cities_built >= 1);
        assert_eq!(later.drawables, later.cities_built as usize * 12);
        assert_eq!(later.frames, 16 * 60);
    }

    #[test]
    fn headless_run_is_reproducible_for_a_seed() {
        let first = run_headless(scheduled(42), Duration::from_secs(300), 30);
        let second = run_headless(scheduled(42), Duration::from_secs(300), 30);
        assert_eq!(first, second);
    }

    #[test]
    fn manual_mode_builds_nothing_without_presses() {
        let strategy = build_strategy(
            SpawnMode::Manual,
            AssetCatalog::reference(),
            GridDimensions::reference(),
            ChaCha8Rng::seed_from_u64(1),
        );
        let summary = run_headless(strategy, Duration::from_secs(60), 60);
        assert_eq!(summary.cities_built, 0);
        assert_eq!(summary.drawables, 0);
    }

    #[test]
    fn hud_label_reports_count_and_mode() {
        let label = hud_label(SpawnMode::Scheduled, 4);
        assert!(label.starts_with("Cities built: 4\nMode: scheduled"));
        assert!(hud_label(SpawnMode::Manual, 0).contains("F1"));
    }
}
