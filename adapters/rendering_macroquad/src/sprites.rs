use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use macroquad::{
    math::{Rect, Vec2 as MacroquadVec2},
    texture::{self, DrawTextureParams, FilterMode, Texture2D},
};
use traffic_manager_core::{AssetRef, TextureKey};
use traffic_manager_rendering::{Color, SourceRect, SpriteSheetLayout};

use crate::to_macroquad_color;

/// Identifies a texture file backing the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SpriteKey {
    /// Sheet holding every city sub-tile.
    CitySheet,
    /// Single-image city used for manual placement.
    City,
}

/// Locations of the texture files loaded by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    /// Sprite sheet sliced into 16×16 city sub-tiles.
    pub sprite_sheet: PathBuf,
    /// Stand-alone city texture.
    pub city_texture: PathBuf,
}

impl AssetPaths {
    fn path(&self, key: SpriteKey) -> &Path {
        match key {
            SpriteKey::CitySheet => &self.sprite_sheet,
            SpriteKey::City => &self.city_texture,
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            sprite_sheet: PathBuf::from("textures/citySheet.png"),
            city_texture: PathBuf::from("textures/city.png"),
        }
    }
}

/// Parameters describing where a sprite lands on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawParams {
    /// Position in screen-space pixels where the sprite's top-left corner is placed.
    pub(crate) position: Vec2,
    /// Multiplier applied to the sprite's source size.
    pub(crate) scale: Vec2,
    /// Tint applied to the sprite.
    pub(crate) tint: Color,
}

impl DrawParams {
    pub(crate) fn new(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            scale,
            tint: Color::WHITE,
        }
    }
}

/// Textures loaded from disk once at startup.
#[derive(Debug)]
pub(crate) struct SpriteAtlas {
    sheet: Texture2D,
    city: Texture2D,
    layout: SpriteSheetLayout,
}

impl SpriteAtlas {
    /// Loads every texture referenced by `paths`.
    pub(crate) fn load(paths: &AssetPaths) -> Result<Self> {
        Self::from_paths_with_loader(paths, default_loader)
    }

    /// Draws the requested asset using the supplied parameters.
    pub(crate) fn draw(&self, asset: AssetRef, params: DrawParams) -> Result<()> {
        let (texture, source) = match asset {
            AssetRef::SheetCell(index) => {
                let sheet_size = Vec2::new(self.sheet.width(), self.sheet.height());
                let source = self
                    .layout
                    .source_rect(index, sheet_size)
                    .with_context(|| format!("sprite sheet has no cell {index}"))?;
                (self.sheet, source)
            }
            AssetRef::Texture(TextureKey::City) => (
                self.city,
                SourceRect {
                    origin: Vec2::ZERO,
                    size: Vec2::new(self.city.width(), self.city.height()),
                },
            ),
        };

        let dest_size = source.size * params.scale;
        let draw_params = DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(dest_size.x, dest_size.y)),
            source: Some(Rect::new(
                source.origin.x,
                source.origin.y,
                source.size.x,
                source.size.y,
            )),
            ..DrawTextureParams::default()
        };

        texture::draw_texture_ex(
            texture,
            params.position.x,
            params.position.y,
            to_macroquad_color(params.tint),
            draw_params,
        );

        Ok(())
    }

    fn from_paths_with_loader(
        paths: &AssetPaths,
        mut loader: impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut load = |key: SpriteKey| {
            let path = paths.path(key);
            loader(key, path).with_context(|| {
                format!("failed to load sprite {key:?} from {}", path.display())
            })
        };
        let sheet = load(SpriteKey::CitySheet)?;
        let city = load(SpriteKey::City)?;

        Ok(Self {
            sheet,
            city,
            layout: SpriteSheetLayout::CITY_SHEET,
        })
    }
}

/// Leading bytes of every PNG file.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Rejects files whose PNG signature or image header is malformed.
fn validate_png(bytes: &[u8]) -> Result<()> {
    ensure!(
        bytes.starts_with(&PNG_SIGNATURE),
        "not a PNG file (missing signature)"
    );
    // IHDR length and tag, then width and height.
    let header = bytes.get(8..24).context("PNG file is truncated before its header")?;
    ensure!(&header[4..8] == b"IHDR", "PNG file does not start with an IHDR chunk");

    let width = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);
    let height = u32::from_be_bytes([header[12], header[13], header[14], header[15]]);
    ensure!(
        width > 0 && height > 0,
        "PNG image has no pixels ({width}x{height})"
    );
    Ok(())
}

fn default_loader(_key: SpriteKey, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    validate_png(&bytes)
        .with_context(|| format!("invalid sprite asset at {}", path.display()))?;
    let texture = Texture2D::from_file_with_format(&bytes, None);
    texture.set_filter(FilterMode::Nearest);
    Ok(texture)
}
