#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Traffic Manager adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;
use traffic_manager_core::{
    ButtonState, DrawCommand, Drawable, GridDimensions, PointerPosition, RenderSink, Transform,
    HUD_LAYER, TERRAIN_LAYER, TILE_SIZE,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Edge-aware state of the build trigger on this frame.
    pub build_trigger: ButtonState,
    /// Cursor position expressed in world pixels, if the cursor is known.
    pub cursor_world_space: Option<Vec2>,
}

impl FrameInput {
    /// Cursor position in the form consumed by spawn strategies.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerPosition> {
        self.cursor_world_space
            .map(|cursor| PointerPosition::new(cursor.x, cursor.y))
    }
}

/// Pixel rectangle within a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRect {
    /// Top-left corner of the rectangle.
    pub origin: Vec2,
    /// Extent of the rectangle.
    pub size: Vec2,
}

/// Slicing rules of a sprite sheet made of equally sized cells separated by a border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteSheetLayout {
    cell_size: f32,
    border: f32,
}

impl SpriteSheetLayout {
    /// Layout of the city sprite sheet: 16 pixel cells separated by 1 pixel.
    pub const CITY_SHEET: Self = Self {
        cell_size: 16.0,
        border: 1.0,
    };

    /// Creates a sprite sheet layout.
    ///
    /// Returns an error when `cell_size` is not positive or `border` is negative.
    pub fn new(cell_size: f32, border: f32) -> Result<Self, RenderingError> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        if border < 0.0 || !border.is_finite() {
            return Err(RenderingError::InvalidBorder { border });
        }
        Ok(Self { cell_size, border })
    }

    /// Number of cells along each axis of a sheet with the provided dimensions.
    #[must_use]
    pub fn cells_per_axis(&self, sheet_size: Vec2) -> (u32, u32) {
        let stride = self.cell_size + self.border;
        let columns = ((sheet_size.x + self.border) / stride).floor().max(0.0) as u32;
        let rows = ((sheet_size.y + self.border) / stride).floor().max(0.0) as u32;
        (columns, rows)
    }

    /// Source rectangle of the cell with the provided row-major index.
    ///
    /// Returns `None` when the index lies outside the sheet.
    #[must_use]
    pub fn source_rect(&self, index: u32, sheet_size: Vec2) -> Option<SourceRect> {
        let (columns, rows) = self.cells_per_axis(sheet_size);
        if columns == 0 || index / columns >= rows {
            return None;
        }

        let stride = self.cell_size + self.border;
        let column = index % columns;
        let row = index / columns;
        Some(SourceRect {
            origin: Vec2::new(column as f32 * stride, row as f32 * stride),
            size: Vec2::splat(self.cell_size),
        })
    }
}

/// Base terrain drawn beneath every city.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainPresentation {
    /// Top-left corner of the terrain in world pixels.
    pub origin: Vec2,
    /// Extent of the terrain in world pixels.
    pub size: Vec2,
    /// Fill color of the terrain.
    pub color: Color,
    /// Color used for tile outlines.
    pub line_color: Color,
    /// Side length of a terrain tile in world pixels.
    pub tile_length: f32,
}

impl TerrainPresentation {
    /// Creates terrain covering every tile cities can be placed on.
    ///
    /// Cities are anchored one tile in from the top-left corner, so the
    /// terrain starts at `(tile_length, tile_length)`.
    pub fn for_grid(
        grid: GridDimensions,
        tile_length: f32,
        color: Color,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if tile_length <= 0.0 || !tile_length.is_finite() {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            origin: Vec2::splat(tile_length),
            size: Vec2::new(
                grid.columns() as f32 * tile_length,
                grid.rows() as f32 * tile_length,
            ),
            color,
            line_color,
            tile_length,
        })
    }

    /// Terrain for the reference grid using the reference tile size.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            origin: Vec2::splat(TILE_SIZE),
            size: Vec2::new(
                GridDimensions::reference().columns() as f32 * TILE_SIZE,
                GridDimensions::reference().rows() as f32 * TILE_SIZE,
            ),
            color: Color::from_rgb_u8(196, 222, 160),
            line_color: Color::from_rgb_u8(170, 196, 136),
            tile_length: TILE_SIZE,
        }
    }

    /// Drawing layer of the terrain.
    #[must_use]
    pub const fn layer(&self) -> i32 {
        TERRAIN_LAYER
    }
}

/// Heads-up display panel pinned to the bottom-left corner of the window.
#[derive(Clone, Debug, PartialEq)]
pub struct HudPresentation {
    /// Top-left corner of the panel in screen pixels.
    pub origin: Vec2,
    /// Extent of the panel in screen pixels.
    pub size: Vec2,
    /// Fill color of the panel.
    pub color: Color,
    /// Text shown inside the panel.
    pub label: String,
}

impl HudPresentation {
    /// Fill color of the panel.
    pub const PANEL_COLOR: Color = Color::new(205.0 / 255.0, 205.0 / 255.0, 205.0 / 255.0, 1.0);

    /// Creates a panel one quarter of the window in each dimension.
    pub fn for_window(width: f32, height: f32) -> Result<Self, RenderingError> {
        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return Err(RenderingError::InvalidWindowSize { width, height });
        }

        let size = Vec2::new(width / 4.0, height / 4.0);
        Ok(Self {
            origin: Vec2::new(0.0, height - size.y),
            size,
            color: Self::PANEL_COLOR,
            label: String::new(),
        })
    }

    /// Drawing layer of the panel.
    #[must_use]
    pub const fn layer(&self) -> i32 {
        HUD_LAYER
    }
}

/// Drawable added to the scene together with its placement.
pub type SceneDrawable = DrawCommand;

/// Scene description combining the terrain, placed cities and the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Base terrain drawn beneath cities.
    pub terrain: TerrainPresentation,
    /// Every drawable added by spawn strategies, in insertion order.
    pub drawables: Vec<SceneDrawable>,
    /// Heads-up display drawn above everything else.
    pub hud: HudPresentation,
}

impl Scene {
    /// Creates a new scene descriptor without any drawables.
    #[must_use]
    pub fn new(terrain: TerrainPresentation, hud: HudPresentation) -> Self {
        Self {
            terrain,
            drawables: Vec::new(),
            hud,
        }
    }

    /// Drawables ordered by ascending layer, preserving insertion order within a layer.
    ///
    /// Drawables without a layer are treated as lying on the terrain layer.
    #[must_use]
    pub fn drawables_by_layer(&self) -> Vec<&SceneDrawable> {
        let mut ordered: Vec<&SceneDrawable> = self.drawables.iter().collect();
        ordered.sort_by_key(|drawable| drawable.transform.layer.unwrap_or(TERRAIN_LAYER));
        ordered
    }
}

impl RenderSink for Scene {
    fn add(&mut self, drawable: Drawable, transform: Transform) {
        self.drawables.push(DrawCommand {
            drawable,
            transform,
        });
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(
        window_title: T,
        window_width: u32,
        window_height: u32,
        clear_color: Color,
        scene: Scene,
    ) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            window_width,
            window_height,
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Traffic Manager scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may add drawables to the
    /// scene before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RenderingError {
    /// Sprite sheet cells must have a positive size.
    #[error("sprite sheet cell size must be positive (received {cell_size})")]
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
    /// Sprite sheet borders must not be negative.
    #[error("sprite sheet border must not be negative (received {border})")]
    InvalidBorder {
        /// Provided border that failed validation.
        border: f32,
    },
    /// Terrain tiles must have a positive side length.
    #[error("tile length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
    /// The window must have a positive area.
    #[error("window size must be positive (received {width}x{height})")]
    InvalidWindowSize {
        /// Provided width that failed validation.
        width: f32,
        /// Provided height that failed validation.
        height: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_manager_core::{
        AssetRef, FootprintId, PixelPoint, PixelSize, Scale, TextureKey, CITY_LAYER,
    };

    fn drawable(asset: AssetRef, layer: Option<i32>) -> (Drawable, Transform) {
        (
            Drawable {
                asset,
                footprint: FootprintId::new(0),
            },
            Transform {
                position: PixelPoint::new(0.0, 0.0),
                size: PixelSize::square(16.0),
                scale: Scale::ONE,
                layer,
            },
        )
    }

    #[test]
    fn sprite_sheet_counts_cells_with_borders() {
        let layout = SpriteSheetLayout::CITY_SHEET;
        assert_eq!(layout.cells_per_axis(Vec2::new(33.0, 16.0)), (2, 1));
        assert_eq!(layout.cells_per_axis(Vec2::new(32.0, 15.0)), (1, 0));
    }

    #[test]
    fn sprite_sheet_source_rect_skips_borders() {
        let layout = SpriteSheetLayout::CITY_SHEET;
        let sheet = Vec2::new(50.0, 50.0);

        let first = layout.source_rect(0, sheet).expect("first cell");
        assert_eq!(first.origin, Vec2::ZERO);
        assert_eq!(first.size, Vec2::splat(16.0));

        let fifth = layout.source_rect(4, sheet).expect("second row");
        assert_eq!(fifth.origin, Vec2::new(17.0, 17.0));

        assert!(layout.source_rect(9, sheet).is_none());
    }

    #[test]
    fn sprite_sheet_layout_rejects_invalid_dimensions() {
        assert_eq!(
            SpriteSheetLayout::new(0.0, 1.0),
            Err(RenderingError::InvalidCellSize { cell_size: 0.0 })
        );
        assert_eq!(
            SpriteSheetLayout::new(16.0, -1.0),
            Err(RenderingError::InvalidBorder { border: -1.0 })
        );
        assert_eq!(SpriteSheetLayout::new(16.0, 1.0), Ok(SpriteSheetLayout::CITY_SHEET));
    }

    #[test]
    fn hud_occupies_bottom_left_quarter() {
        let hud = HudPresentation::for_window(800.0, 800.0).expect("valid window");
        assert_eq!(hud.size, Vec2::new(200.0, 200.0));
        assert_eq!(hud.origin, Vec2::new(0.0, 600.0));
        assert_eq!(hud.layer(), HUD_LAYER);
        assert_eq!(hud.color, Color::from_rgb_u8(205, 205, 205));
        assert!(HudPresentation::for_window(0.0, 800.0).is_err());
    }

    #[test]
    fn terrain_covers_grid_offset_by_one_tile() {
        let terrain = TerrainPresentation::for_grid(
            GridDimensions::reference(),
            64.0,
            Color::WHITE,
            Color::WHITE,
        )
        .expect("valid tile length");
        let reference = TerrainPresentation::reference();
        assert_eq!(terrain.origin, Vec2::splat(64.0));
        assert_eq!(terrain.size, Vec2::splat(18.0 * 64.0));
        assert_eq!(terrain.origin, reference.origin);
        assert_eq!(terrain.size, reference.size);
        assert_eq!(terrain.layer(), TERRAIN_LAYER);
        assert!(TerrainPresentation::for_grid(
            GridDimensions::reference(),
            0.0,
            Color::WHITE,
            Color::WHITE
        )
        .is_err());
    }

    #[test]
    fn scene_collects_drawables_and_orders_by_layer() {
        let terrain = TerrainPresentation::reference();
        let hud = HudPresentation::for_window(800.0, 800.0).expect("valid window");
        let mut scene = Scene::new(terrain, hud);

        let (city, city_transform) = drawable(AssetRef::SheetCell(1), Some(CITY_LAYER));
        let (manual, manual_transform) = drawable(AssetRef::Texture(TextureKey::City), None);
        scene.add(city, city_transform);
        scene.add(manual, manual_transform);

        assert_eq!(scene.drawables.len(), 2);
        let ordered = scene.drawables_by_layer();
        assert_eq!(ordered[0].drawable.asset, AssetRef::Texture(TextureKey::City));
        assert_eq!(ordered[1].drawable.asset, AssetRef::SheetCell(1));
    }

    #[test]
    fn frame_input_exposes_pointer() {
        let input = FrameInput {
            build_trigger: ButtonState::JustPressed,
            cursor_world_space: Some(Vec2::new(120.0, 340.0)),
        };
        assert_eq!(input.pointer(), Some(PointerPosition::new(120.0, 340.0)));
        assert_eq!(FrameInput::default().pointer(), None);
    }
}
