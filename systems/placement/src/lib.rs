#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement selector that picks free grid cells for new cities and lays out
//! their sprite footprints.

use rand::Rng;
use traffic_manager_core::{
    AssetRef, CellCoord, CellIndex, Drawable, FootprintId, GridDimensions, PixelPoint, PixelSize,
    PlacementVariant, RenderSink, Scale, Transform, CITY_LAYER, FOOTPRINT_COLUMNS,
    FOOTPRINT_MARGIN, FOOTPRINT_ROWS, SUB_TILE_SIZE, TILE_SIZE,
};

/// Occupied-set size above which duplicate cells are accepted instead of redrawn.
pub const OCCUPANCY_SATURATION_CAP: usize = 300;

/// Append-only record of every cell handed out by [`select_cell`].
///
/// Entries are never removed. Once the record grows beyond
/// [`OCCUPANCY_SATURATION_CAP`] it may contain the same cell more than once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupiedSet {
    cells: Vec<CellIndex>,
    distinct: usize,
}

impl OccupiedSet {
    /// Creates an empty occupied set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded selections, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether nothing has been selected yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of distinct cells recorded.
    #[must_use]
    pub fn distinct_len(&self) -> usize {
        self.distinct
    }

    /// Reports whether the cell has been selected before.
    #[must_use]
    pub fn contains(&self, index: CellIndex) -> bool {
        self.cells.contains(&index)
    }

    /// Selections in the order they were made.
    #[must_use]
    pub fn as_slice(&self) -> &[CellIndex] {
        &self.cells
    }

    fn record(&mut self, index: CellIndex, first_time: bool) {
        if first_time {
            self.distinct += 1;
        }
        self.cells.push(index);
    }
}

/// Picks a cell uniformly at random that has not been selected before and records it.
///
/// Cells are redrawn until a free one turns up. When the occupied set holds
/// more than [`OCCUPANCY_SATURATION_CAP`] entries, or every cell of the grid
/// is already taken, the first draw is accepted even if it repeats an earlier
/// selection so the call always terminates.
pub fn select_cell<R>(occupied: &mut OccupiedSet, grid: GridDimensions, rng: &mut R) -> CellIndex
where
    R: Rng + ?Sized,
{
    let cell_count = usize::try_from(grid.cell_count()).unwrap_or(usize::MAX);
    let saturated =
        occupied.len() > OCCUPANCY_SATURATION_CAP || occupied.distinct_len() >= cell_count;

    loop {
        let column = rng.gen_range(0..grid.columns());
        let row = rng.gen_range(0..grid.rows());
        let index = CellIndex::new(column + row * grid.columns());
        let taken = occupied.contains(index);

        if !taken || saturated {
            occupied.record(index, !taken);
            return index;
        }
    }
}

/// Top-left pixel of the footprint of a city built on the provided cell.
#[must_use]
pub fn footprint_anchor(cell: CellCoord) -> PixelPoint {
    PixelPoint::new(
        (cell.column() + 1) as f32 * TILE_SIZE + FOOTPRINT_MARGIN,
        (cell.row() + 1) as f32 * TILE_SIZE,
    )
}

/// Emits the sub-tile drawables composing a city built on `cell`.
///
/// Every sub-tile shares `footprint` and sits on [`CITY_LAYER`]. Returns the
/// number of drawables emitted.
pub fn emit_footprint(
    sink: &mut dyn RenderSink,
    cell: CellCoord,
    variant: &PlacementVariant,
    footprint: FootprintId,
) -> usize {
    let anchor = footprint_anchor(cell);
    let mut emitted = 0;

    for column in 0..FOOTPRINT_COLUMNS {
        for row in 0..FOOTPRINT_ROWS {
            let Some(sheet_cell) = variant.cell_at(column, row) else {
                continue;
            };
            let position = anchor.offset(
                column as f32 * SUB_TILE_SIZE,
                row as f32 * SUB_TILE_SIZE,
            );
            sink.add(
                Drawable {
                    asset: AssetRef::SheetCell(sheet_cell),
                    footprint,
                },
                Transform {
                    position,
                    size: PixelSize::square(SUB_TILE_SIZE),
                    scale: Scale::ONE,
                    layer: Some(CITY_LAYER),
                },
            );
            emitted += 1;
        }
    }

    emitted
}
