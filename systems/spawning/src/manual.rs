//! Input-driven spawner placing a single-sprite city under the pointer.

use traffic_manager_core::{
    AssetCatalog, AssetRef, Drawable, FallbackFootprint, FootprintId, RenderSink, Transform,
};

use crate::{SpawnFrame, SpawnStrategy};

/// Spawner that places one city each time the build trigger is pressed.
///
/// Cities land at the pointer without occupancy tracking or scheduling, so
/// they may overlap freely.
#[derive(Clone, Debug)]
pub struct ManualSpawner {
    footprint: FallbackFootprint,
    next_footprint: FootprintId,
    built: u32,
}

impl ManualSpawner {
    /// Creates a manual spawner drawing cities with the catalog's fallback footprint.
    #[must_use]
    pub fn new(catalog: &AssetCatalog) -> Self {
        Self {
            footprint: *catalog.fallback(),
            next_footprint: FootprintId::new(0),
            built: 0,
        }
    }
}

impl SpawnStrategy for ManualSpawner {
    fn on_frame(&mut self, frame: &SpawnFrame, sink: &mut dyn RenderSink) -> usize {
        if !frame.trigger.just_pressed() {
            return 0;
        }

        let Some(pointer) = frame.pointer else {
            tracing::warn!("build requested before any pointer position was observed");
            return 0;
        };

        let footprint = self.next_footprint;
        self.next_footprint = footprint.next();
        self.built = self.built.saturating_add(1);

        sink.add(
            Drawable {
                asset: AssetRef::Texture(self.footprint.texture),
                footprint,
            },
            Transform {
                position: pointer.to_pixel(),
                size: self.footprint.size,
                scale: self.footprint.scale,
                layer: None,
            },
        );
        tracing::debug!(x = pointer.x, y = pointer.y, built = self.built, "city placed by hand");

        1
    }

    fn cities_built(&self) -> u32 {
        self.built
    }
}
