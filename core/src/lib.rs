#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Traffic Manager engine.
//!
//! This crate defines the message surface that connects spawn strategies with
//! rendering adapters. Strategies decide where and when a city appears and
//! describe it as a batch of [`Drawable`] values paired with a [`Transform`].
//! Those descriptors are handed to a [`RenderSink`] supplied by the driver;
//! the core never discovers its renderer at runtime and never removes what it
//! has added.

use serde::{Deserialize, Serialize};

/// Canonical title used when the experience boots.
pub const WINDOW_TITLE: &str = "Traffic Manager";

/// Number of tile columns available for city placement.
pub const GRID_COLUMNS: u32 = 18;

/// Number of tile rows available for city placement.
pub const GRID_ROWS: u32 = 18;

/// Side length of a single placement tile in pixels.
pub const TILE_SIZE: f32 = 64.0;

/// Horizontal inset applied to a city footprint within its tile.
pub const FOOTPRINT_MARGIN: f32 = 8.0;

/// Side length of a single sprite-sheet cell in pixels.
pub const SUB_TILE_SIZE: f32 = 16.0;

/// Number of sub-tile columns composing a city footprint.
pub const FOOTPRINT_COLUMNS: u32 = 3;

/// Number of sub-tile rows composing a city footprint.
pub const FOOTPRINT_ROWS: u32 = 4;

/// Number of sub-tiles drawn for every scheduled city.
pub const SUB_TILES_PER_FOOTPRINT: usize = (FOOTPRINT_COLUMNS * FOOTPRINT_ROWS) as usize;

/// Layer occupied by the base terrain.
pub const TERRAIN_LAYER: i32 = 0;

/// Layer occupied by city sub-tiles, drawn above the terrain.
pub const CITY_LAYER: i32 = 1;

/// Layer occupied by the heads-up display, drawn above everything else.
pub const HUD_LAYER: i32 = 1_000;

/// Zero-based index of a grid cell computed as `column + row * columns`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex(u32);

impl CellIndex {
    /// Creates a new cell index from its raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Fixed dimensions of the placement grid.
///
/// The grid itself carries no state; occupancy is tracked by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates grid dimensions, rejecting grids without any cells.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Option<Self> {
        if columns == 0 || rows == 0 {
            return None;
        }
        match columns.checked_mul(rows) {
            Some(_) => Some(Self { columns, rows }),
            None => None,
        }
    }

    /// Dimensions of the reference 18×18 placement grid.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            columns: GRID_COLUMNS,
            rows: GRID_ROWS,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of addressable cells.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Computes the index of the provided coordinate, if it lies inside the grid.
    #[must_use]
    pub const fn index_of(&self, cell: CellCoord) -> Option<CellIndex> {
        if cell.column() < self.columns && cell.row() < self.rows {
            Some(CellIndex(cell.column() + cell.row() * self.columns))
        } else {
            None
        }
    }

    /// Recovers the coordinate addressed by the provided index.
    #[must_use]
    pub const fn coord_of(&self, index: CellIndex) -> Option<CellCoord> {
        if index.get() < self.cell_count() {
            Some(CellCoord::new(
                index.get() % self.columns,
                index.get() / self.columns,
            ))
        } else {
            None
        }
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::reference()
    }
}

/// Two-dimensional position expressed in world pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate, growing downwards.
    pub y: f32,
}

impl PixelPoint {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the point translated by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Width and height of a drawable expressed in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSize {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl PixelSize {
    /// Creates a new size descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Creates a square size descriptor.
    #[must_use]
    pub const fn square(length: f32) -> Self {
        Self::new(length, length)
    }
}

/// Per-axis scale factor applied to a drawable's source asset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Horizontal scale factor.
    pub x: f32,
    /// Vertical scale factor.
    pub y: f32,
}

impl Scale {
    /// Identity scale.
    pub const ONE: Self = Self::uniform(1.0);

    /// Creates a scale applying the same factor to both axes.
    #[must_use]
    pub const fn uniform(factor: f32) -> Self {
        Self {
            x: factor,
            y: factor,
        }
    }
}

/// Last observed pointer coordinate reported by the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerPosition {
    /// Horizontal pointer coordinate in world pixels.
    pub x: f32,
    /// Vertical pointer coordinate in world pixels.
    pub y: f32,
}

impl PointerPosition {
    /// Creates a new pointer position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Converts the pointer position into a world pixel position.
    #[must_use]
    pub const fn to_pixel(self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// Edge-aware state of a discrete input button for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// The button is not held.
    #[default]
    Released,
    /// The button went down during this frame.
    JustPressed,
    /// The button was already down during the previous frame.
    Held,
}

impl ButtonState {
    /// Derives the edge-aware state from the level observed on two consecutive frames.
    #[must_use]
    pub const fn from_levels(was_down: bool, is_down: bool) -> Self {
        match (was_down, is_down) {
            (false, true) => Self::JustPressed,
            (true, true) => Self::Held,
            (_, false) => Self::Released,
        }
    }

    /// Reports whether the button went down during this frame.
    #[must_use]
    pub const fn just_pressed(self) -> bool {
        matches!(self, Self::JustPressed)
    }

    /// Reports whether the button is down, regardless of when it was pressed.
    #[must_use]
    pub const fn is_down(self) -> bool {
        !matches!(self, Self::Released)
    }
}

/// Stand-alone textures referenced by drawables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureKey {
    /// Single-image city used by the manual placement mode.
    City,
}

/// Visual asset referenced by a drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetRef {
    /// Cell of the city sprite sheet addressed by its linear index.
    SheetCell(u32),
    /// Stand-alone texture.
    Texture(TextureKey),
}

/// Identifier shared by every drawable belonging to one placed city.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FootprintId(u32);

impl FootprintId {
    /// Creates a new footprint identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Renderable entity emitted by a spawn strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Drawable {
    /// Asset rendered for the entity.
    pub asset: AssetRef,
    /// City footprint the entity belongs to.
    pub footprint: FootprintId,
}

/// Placement of a drawable within the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Top-left corner of the drawable in world pixels.
    pub position: PixelPoint,
    /// Extent of the drawable in world pixels.
    pub size: PixelSize,
    /// Scale applied to the source asset.
    pub scale: Scale,
    /// Depth ordering; `None` leaves the renderer's default layer in place.
    pub layer: Option<i32>,
}

/// One-shot request to add a drawable to the rendered scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    /// Entity to add.
    pub drawable: Drawable,
    /// Where and how the entity is placed.
    pub transform: Transform,
}

/// Rendering collaborator that accepts newly spawned drawables.
///
/// Implementations only ever receive additions; removal, animation and
/// redraw remain the collaborator's concern.
pub trait RenderSink {
    /// Adds a drawable placed with the provided transform.
    fn add(&mut self, drawable: Drawable, transform: Transform);
}

impl RenderSink for Vec<DrawCommand> {
    fn add(&mut self, drawable: Drawable, transform: Transform) {
        self.push(DrawCommand {
            drawable,
            transform,
        });
    }
}

/// Fixed 3×4 arrangement of sprite-sheet cells composing one city layout.
///
/// Entries are stored row-major: sub-tile `(column, row)` uses entry
/// `column + FOOTPRINT_COLUMNS * row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementVariant {
    cells: [u32; SUB_TILES_PER_FOOTPRINT],
}

impl PlacementVariant {
    /// Creates a variant from its row-major sprite-sheet cells.
    #[must_use]
    pub const fn new(cells: [u32; SUB_TILES_PER_FOOTPRINT]) -> Self {
        Self { cells }
    }

    /// Sprite-sheet cell drawn at the provided sub-tile, if it lies inside the footprint.
    #[must_use]
    pub fn cell_at(&self, column: u32, row: u32) -> Option<u32> {
        if column >= FOOTPRINT_COLUMNS || row >= FOOTPRINT_ROWS {
            return None;
        }
        let index = usize::try_from(column + FOOTPRINT_COLUMNS * row).ok()?;
        self.cells.get(index).copied()
    }

    /// All sprite-sheet cells in row-major order.
    #[must_use]
    pub const fn cells(&self) -> &[u32; SUB_TILES_PER_FOOTPRINT] {
        &self.cells
    }
}

const REFERENCE_VARIANTS: [PlacementVariant; 10] = [
    PlacementVariant::new([99, 100, 101, 454, 269, 455, 415, 195, 416, 452, 306, 453]),
    PlacementVariant::new([99, 100, 101, 268, 269, 270, 268, 269, 270, 303, 304, 305]),
    PlacementVariant::new([75, 76, 77, 446, 261, 447, 446, 261, 447, 444, 298, 445]),
    PlacementVariant::new([75, 76, 77, 407, 187, 408, 407, 187, 408, 442, 188, 443]),
    PlacementVariant::new([75, 76, 77, 261, 261, 261, 298, 298, 298, 298, 261, 261]),
    PlacementVariant::new([75, 76, 77, 407, 187, 408, 407, 187, 408, 444, 298, 445]),
    PlacementVariant::new([75, 76, 77, 407, 187, 408, 407, 187, 408, 442, 188, 443]),
    PlacementVariant::new([75, 76, 77, 446, 261, 447, 446, 261, 447, 444, 298, 445]),
    PlacementVariant::new([99, 100, 101, 454, 269, 455, 415, 195, 416, 452, 306, 453]),
    PlacementVariant::new([99, 100, 101, 268, 269, 270, 268, 269, 270, 303, 304, 305]),
];

/// Single-drawable footprint used when a city is placed by hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackFootprint {
    /// Texture drawn for the city.
    pub texture: TextureKey,
    /// Extent of the city in world pixels.
    pub size: PixelSize,
    /// Scale applied to the texture.
    pub scale: Scale,
}

impl Default for FallbackFootprint {
    fn default() -> Self {
        Self {
            texture: TextureKey::City,
            size: PixelSize::new(30.0, 64.0),
            scale: Scale::uniform(0.1),
        }
    }
}

/// Catalog of city visuals owned by the driver and lent to spawn strategies.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetCatalog {
    variants: Vec<PlacementVariant>,
    fallback: FallbackFootprint,
}

impl AssetCatalog {
    /// Creates a catalog from explicit variants, rejecting an empty variant list.
    #[must_use]
    pub fn new(variants: Vec<PlacementVariant>, fallback: FallbackFootprint) -> Option<Self> {
        if variants.is_empty() {
            return None;
        }
        Some(Self { variants, fallback })
    }

    /// Catalog containing the ten reference city layouts.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            variants: REFERENCE_VARIANTS.to_vec(),
            fallback: FallbackFootprint::default(),
        }
    }

    /// Number of variants available. Never zero.
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Retrieves the variant stored at the provided index.
    #[must_use]
    pub fn variant(&self, index: usize) -> Option<&PlacementVariant> {
        self.variants.get(index)
    }

    /// Footprint used for manually placed cities.
    #[must_use]
    pub const fn fallback(&self) -> &FallbackFootprint {
        &self.fallback
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_rejects_empty_dimensions() {
        assert!(GridDimensions::new(0, 18).is_none());
        assert!(GridDimensions::new(18, 0).is_none());
        assert!(GridDimensions::new(u32::MAX, 2).is_none());
        assert_eq!(GridDimensions::new(18, 18), Some(GridDimensions::reference()));
    }

    #[test]
    fn index_addressing_is_row_major() {
        let grid = GridDimensions::reference();
        let index = grid.index_of(CellCoord::new(3, 2)).expect("inside grid");
        assert_eq!(index.get(), 3 + 2 * 18);
        assert_eq!(grid.coord_of(index), Some(CellCoord::new(3, 2)));
        assert!(grid.index_of(CellCoord::new(18, 0)).is_none());
        assert!(grid.coord_of(CellIndex::new(18 * 18)).is_none());
    }

    #[test]
    fn button_state_tracks_press_edges() {
        assert_eq!(ButtonState::from_levels(false, true), ButtonState::JustPressed);
        assert_eq!(ButtonState::from_levels(true, true), ButtonState::Held);
        assert_eq!(ButtonState::from_levels(true, false), ButtonState::Released);
        assert!(ButtonState::JustPressed.just_pressed());
        assert!(!ButtonState::Held.just_pressed());
        assert!(ButtonState::Held.is_down());
    }

    #[test]
    fn variant_lookup_follows_row_major_layout() {
        let variant = PlacementVariant::new([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(variant.cell_at(0, 0), Some(0));
        assert_eq!(variant.cell_at(2, 0), Some(2));
        assert_eq!(variant.cell_at(0, 1), Some(3));
        assert_eq!(variant.cell_at(2, 3), Some(11));
        assert_eq!(variant.cell_at(3, 0), None);
        assert_eq!(variant.cell_at(0, 4), None);
    }

    #[test]
    fn reference_catalog_holds_ten_variants() {
        let catalog = AssetCatalog::reference();
        assert_eq!(catalog.variant_count(), 10);
        assert!(catalog.variant(9).is_some());
        assert!(catalog.variant(10).is_none());
        assert_eq!(catalog.fallback().size, PixelSize::new(30.0, 64.0));
    }

    #[test]
    fn catalog_requires_at_least_one_variant() {
        assert!(AssetCatalog::new(Vec::new(), FallbackFootprint::default()).is_none());
    }

    #[test]
    fn vec_sink_records_commands_in_order() {
        let mut sink: Vec<DrawCommand> = Vec::new();
        let transform = Transform {
            position: PixelPoint::new(1.0, 2.0),
            size: PixelSize::square(SUB_TILE_SIZE),
            scale: Scale::ONE,
            layer: Some(CITY_LAYER),
        };
        sink.add(
            Drawable {
                asset: AssetRef::SheetCell(7),
                footprint: FootprintId::new(0),
            },
            transform,
        );
        sink.add(
            Drawable {
                asset: AssetRef::Texture(TextureKey::City),
                footprint: FootprintId::new(1),
            },
            transform,
        );

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].drawable.asset, AssetRef::SheetCell(7));
        assert_eq!(sink[1].drawable.footprint, FootprintId::new(1));
    }

    #[test]
    fn placement_variant_round_trips_through_bincode() {
        assert_round_trip(&REFERENCE_VARIANTS[3]);
    }

    #[test]
    fn asset_ref_round_trips_through_bincode() {
        assert_round_trip(&AssetRef::Texture(TextureKey::City));
        assert_round_trip(&AssetRef::SheetCell(454));
    }

    #[test]
    fn grid_dimensions_round_trip_through_bincode() {
        assert_round_trip(&GridDimensions::reference());
    }
}
