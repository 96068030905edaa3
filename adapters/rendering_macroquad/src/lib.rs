#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Traffic Manager.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The world is scaled uniformly to fit the window. Textures are loaded once
//! before the first frame; a missing texture aborts the run and the error is
//! returned from [`RenderingBackend::run`].

mod hud;
mod sprites;

use anyhow::{Context, Result};
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, mouse_position, KeyCode};
use std::{sync::mpsc, time::Duration};
use traffic_manager_core::ButtonState;
use traffic_manager_rendering::{
    FrameInput, Presentation, RenderingBackend, Scene, TerrainPresentation,
};

pub use self::sprites::AssetPaths;
use self::{
    hud::draw_hud,
    sprites::{DrawParams, SpriteAtlas},
};

/// Key that requests a city in manual mode.
const BUILD_KEY: KeyCode = KeyCode::F1;

/// Converts the level of the build key into press edges across frames.
#[derive(Clone, Copy, Debug, Default)]
struct TriggerLatch {
    was_down: bool,
}

impl TriggerLatch {
    /// Records the key level for this frame and returns its edge-aware state.
    fn observe(&mut self, is_down: bool) -> ButtonState {
        let state = ButtonState::from_levels(self.was_down, is_down);
        self.was_down = is_down;
        state
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    assets: AssetPaths,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.swap_interval = if enabled { Some(1) } else { Some(0) };
        self
    }

    /// Configures whether the backend logs frame timing once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures where the backend loads its textures from.
    #[must_use]
    pub fn with_assets(mut self, assets: AssetPaths) -> Self {
        self.assets = assets;
        self
    }
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the average rate once a second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            assets,
        } = self;

        let Presentation {
            window_title,
            window_width,
            window_height,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: i32::try_from(window_width).context("window width too large")?,
            window_height: i32::try_from(window_height).context("window height too large")?,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (atlas_init_sender, atlas_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let loaded = SpriteAtlas::load(&assets).context("failed to initialise sprite atlas");
            let atlas = match loaded {
                Ok(atlas) => {
                    let _ = atlas_init_sender.send(Ok(()));
                    atlas
                }
                Err(error) => {
                    let _ = atlas_init_sender.send(Err(error));
                    return;
                }
            };
            tracing::info!(
                sheet = %assets.sprite_sheet.display(),
                city = %assets.city_texture.display(),
                "sprite atlas loaded"
            );

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut latch = TriggerLatch::default();
            let mut draw_error_reported = false;

            loop {
                if is_key_pressed(KeyCode::Escape) {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                let metrics =
                    SceneMetrics::from_terrain(&scene.terrain, screen_width, screen_height);
                let (cursor_x, cursor_y) = mouse_position();
                let cursor = metrics.screen_to_world(Vec2::new(cursor_x, cursor_y));
                let frame_input = FrameInput {
                    build_trigger: latch.observe(is_key_down(BUILD_KEY)),
                    cursor_world_space: Some(cursor),
                };

                update_scene(frame_dt, frame_input, &mut scene);

                draw_terrain(&scene.terrain, &metrics);
                for drawable in scene.drawables_by_layer() {
                    let position = metrics.world_to_screen(Vec2::new(
                        drawable.transform.position.x,
                        drawable.transform.position.y,
                    ));
                    let scale = Vec2::new(drawable.transform.scale.x, drawable.transform.scale.y)
                        * metrics.scale;
                    if let Err(error) =
                        atlas.draw(drawable.drawable.asset, DrawParams::new(position, scale))
                    {
                        if !draw_error_reported {
                            tracing::warn!("{error:#}");
                            draw_error_reported = true;
                        }
                    }
                }
                draw_hud(&scene.hud);

                if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                    if show_fps {
                        tracing::info!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        atlas_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

/// Uniform scale and offset mapping world pixels onto the window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset: Vec2,
}

impl SceneMetrics {
    /// Fits the terrain plus a one-tile margin on every side into the screen.
    fn from_terrain(terrain: &TerrainPresentation, screen_width: f32, screen_height: f32) -> Self {
        let world = terrain.origin + terrain.size + Vec2::splat(terrain.tile_length);
        let scale = if world.x <= f32::EPSILON || world.y <= f32::EPSILON {
            1.0
        } else {
            (screen_width / world.x).min(screen_height / world.y).max(0.0)
        };
        let offset = Vec2::new(
            ((screen_width - world.x * scale) * 0.5).max(0.0),
            ((screen_height - world.y * scale) * 0.5).max(0.0),
        );

        Self { scale, offset }
    }

    fn world_to_screen(&self, position: Vec2) -> Vec2 {
        self.offset + position * self.scale
    }

    fn screen_to_world(&self, position: Vec2) -> Vec2 {
        if self.scale <= f32::EPSILON {
            return Vec2::ZERO;
        }
        (position - self.offset) / self.scale
    }
}

fn draw_terrain(terrain: &TerrainPresentation, metrics: &SceneMetrics) {
    let origin = metrics.world_to_screen(terrain.origin);
    let size = terrain.size * metrics.scale;
    macroquad::shapes::draw_rectangle(
        origin.x,
        origin.y,
        size.x,
        size.y,
        to_macroquad_color(terrain.color),
    );

    let step = terrain.tile_length * metrics.scale;
    if step <= 1.0 {
        return;
    }
    let line_color = to_macroquad_color(terrain.line_color);
    let columns = (terrain.size.x / terrain.tile_length).round() as u32;
    let rows = (terrain.size.y / terrain.tile_length).round() as u32;
    for column in 0..=columns {
        let x = origin.x + column as f32 * step;
        macroquad::shapes::draw_line(x, origin.y, x, origin.y + size.y, 1.0, line_color);
    }
    for row in 0..=rows {
        let y = origin.y + row as f32 * step;
        macroquad::shapes::draw_line(origin.x, y, origin.x + size.x, y, 1.0, line_color);
    }
}

fn to_macroquad_color(color: traffic_manager_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
