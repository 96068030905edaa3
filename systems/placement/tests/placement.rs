use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use traffic_manager_core::{
    AssetCatalog, AssetRef, CellCoord, DrawCommand, FootprintId, GridDimensions, PixelPoint,
    PixelSize, Scale, CITY_LAYER,
};
use traffic_manager_system_placement::{
    emit_footprint, select_cell, OccupiedSet, OCCUPANCY_SATURATION_CAP,
};

#[test]
fn selections_stay_unique_until_saturation() {
    let grid = GridDimensions::reference();
    let mut occupied = OccupiedSet::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    while occupied.len() <= OCCUPANCY_SATURATION_CAP {
        let before = occupied.clone();
        let index = select_cell(&mut occupied, grid, &mut rng);

        assert!(!before.contains(index), "{index:?} was handed out twice");
        let occurrences = occupied.as_slice().iter().filter(|&&cell| cell == index).count();
        assert_eq!(occurrences, 1);
        assert_eq!(occupied.len(), before.len() + 1);
    }

    assert_eq!(occupied.len(), OCCUPANCY_SATURATION_CAP + 1);
    assert_eq!(occupied.distinct_len(), OCCUPANCY_SATURATION_CAP + 1);
}

#[test]
fn saturated_selection_terminates_and_may_repeat() {
    let grid = GridDimensions::reference();
    let mut occupied = OccupiedSet::new();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..=OCCUPANCY_SATURATION_CAP {
        let _ = select_cell(&mut occupied, grid, &mut rng);
    }

    for _ in 0..500 {
        let index = select_cell(&mut occupied, grid, &mut rng);
        assert!(index.get() < grid.cell_count());
    }

    assert_eq!(occupied.len(), OCCUPANCY_SATURATION_CAP + 1 + 500);
    assert!(
        occupied.distinct_len() < occupied.len(),
        "324 cells cannot hold 801 unique selections"
    );
}

#[test]
fn replay_with_same_seed_selects_same_cells() {
    let grid = GridDimensions::reference();
    let run = |seed| {
        let mut occupied = OccupiedSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..50 {
            let _ = select_cell(&mut occupied, grid, &mut rng);
        }
        occupied
    };

    assert_eq!(run(99), run(99));
}

#[test]
fn footprint_emits_twelve_sub_tiles_on_city_layer() {
    let catalog = AssetCatalog::reference();
    let variant = catalog.variant(1).expect("reference variant");
    let mut sink: Vec<DrawCommand> = Vec::new();

    let emitted = emit_footprint(&mut sink, CellCoord::new(2, 5), variant, FootprintId::new(4));

    assert_eq!(emitted, 12);
    assert_eq!(sink.len(), 12);

    let anchor = PixelPoint::new(3.0 * 64.0 + 8.0, 6.0 * 64.0);
    let mut positions = HashSet::new();
    for command in &sink {
        assert_eq!(command.drawable.footprint, FootprintId::new(4));
        assert_eq!(command.transform.layer, Some(CITY_LAYER));
        assert_eq!(command.transform.size, PixelSize::square(16.0));
        assert_eq!(command.transform.scale, Scale::ONE);

        let dx = command.transform.position.x - anchor.x;
        let dy = command.transform.position.y - anchor.y;
        let column = (dx / 16.0) as u32;
        let row = (dy / 16.0) as u32;
        assert!(column < 3 && row < 4, "offset ({dx}, {dy}) outside footprint");
        assert_eq!(
            command.drawable.asset,
            AssetRef::SheetCell(variant.cell_at(column, row).expect("in footprint"))
        );
        assert!(positions.insert((column, row)), "sub-tile drawn twice");
    }
}

proptest! {
    #[test]
    fn selection_stays_inside_grid(
        seed in any::<u64>(),
        columns in 1u32..24,
        rows in 1u32..24,
        draws in 1usize..64,
    ) {
        let grid = GridDimensions::new(columns, rows).expect("non-empty grid");
        let mut occupied = OccupiedSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for _ in 0..draws {
            let before = occupied.len();
            let index = select_cell(&mut occupied, grid, &mut rng);
            prop_assert!(index.get() < grid.cell_count());
            prop_assert_eq!(occupied.len(), before + 1);
        }
    }

    #[test]
    fn selection_is_unique_while_free_cells_remain(seed in any::<u64>(), draws in 1usize..200) {
        let grid = GridDimensions::reference();
        let mut occupied = OccupiedSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut seen = HashSet::new();

        for _ in 0..draws {
            let index = select_cell(&mut occupied, grid, &mut rng);
            prop_assert!(seen.insert(index));
        }
    }
}
