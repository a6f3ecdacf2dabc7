//! Texture name interning and RGBA pixel loading.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::ResourceResult;

/// Reserved name for the synthetic default texture at array index 0.
pub const DEFAULT_TEXTURE_NAME: &str = "default";

/// Decoded RGBA8 pixel data.
#[derive(Debug, Clone)]
pub struct TexturePixels {
    /// Tightly packed RGBA8 texels, row-major.
    pub pixels: Vec<u8>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl TexturePixels {
    /// Decode an image file to RGBA8.
    pub fn load(path: &Path) -> ResourceResult<Self> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();

        debug!("Decoded texture {:?} ({}x{})", path, width, height);

        Ok(Self {
            pixels: image.into_raw(),
            width,
            height,
        })
    }

    /// The synthetic 2x2 magenta/black checkerboard used at texture
    /// index 0 and whenever a mesh references no texture.
    pub fn default_checkerboard() -> Self {
        const MAGENTA: [u8; 4] = [255, 0, 255, 255];
        const BLACK: [u8; 4] = [0, 0, 0, 255];

        let mut pixels = Vec::with_capacity(2 * 2 * 4);
        for y in 0..2 {
            for x in 0..2 {
                if (x + y) % 2 == 0 {
                    pixels.extend_from_slice(&MAGENTA);
                } else {
                    pixels.extend_from_slice(&BLACK);
                }
            }
        }

        Self {
            pixels,
            width: 2,
            height: 2,
        }
    }
}

/// Dense texture index assignment keyed by texture name.
///
/// Index 0 is always the default checkerboard; every unique name seen
/// during mesh loading gets the next free index. The assignment is what the
/// per-vertex `texture_index` attribute refers to.
#[derive(Debug)]
pub struct TextureRegistry {
    /// Names in index order.
    names: Vec<String>,
    /// Name-to-index lookup.
    lookup: HashMap<String, u32>,
}

impl TextureRegistry {
    /// Create a registry with the default texture pre-interned at index 0.
    pub fn new() -> Self {
        let mut registry = Self {
            names: Vec::new(),
            lookup: HashMap::new(),
        };
        registry.intern(DEFAULT_TEXTURE_NAME);
        registry
    }

    /// Return the index for a name, assigning the next free one on first
    /// sight.
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.lookup.get(name) {
            return index;
        }

        let index = self.names.len() as u32;
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), index);
        index
    }

    /// Number of interned textures (including the default).
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in index order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Decode every registered texture, in index order.
    ///
    /// Index 0 resolves to the synthetic checkerboard; other names are
    /// treated as paths relative to `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first decode failure.
    pub fn load_pixels(&self, base_dir: &Path) -> ResourceResult<Vec<TexturePixels>> {
        let mut all = Vec::with_capacity(self.names.len());

        for name in &self.names {
            if name == DEFAULT_TEXTURE_NAME {
                all.push(TexturePixels::default_checkerboard());
            } else {
                all.push(TexturePixels::load(&base_dir.join(name))?);
            }
        }

        info!("Loaded {} texture(s)", all.len());

        Ok(all)
    }
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_texture_is_index_zero() {
        let mut registry = TextureRegistry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.intern(DEFAULT_TEXTURE_NAME), 0);
    }

    #[test]
    fn interning_is_stable() {
        let mut registry = TextureRegistry::new();
        let brick = registry.intern("brick.png");
        let stone = registry.intern("stone.png");

        assert_eq!(brick, 1);
        assert_eq!(stone, 2);
        assert_eq!(registry.intern("brick.png"), brick);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn checkerboard_is_2x2_magenta_black() {
        let board = TexturePixels::default_checkerboard();
        assert_eq!((board.width, board.height), (2, 2));
        assert_eq!(board.pixels.len(), 16);

        // Diagonal texels are magenta, off-diagonal black
        assert_eq!(&board.pixels[0..4], &[255, 0, 255, 255]);
        assert_eq!(&board.pixels[4..8], &[0, 0, 0, 255]);
        assert_eq!(&board.pixels[8..12], &[0, 0, 0, 255]);
        assert_eq!(&board.pixels[12..16], &[255, 0, 255, 255]);
    }
}
