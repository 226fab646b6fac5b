//! Rasterizes an indexed set of dots, one tile at a time.

use crate::errors::StippleError;
use crate::stipple::config::Configuration;
use crate::float_types::Real;
use crate::stipple::dot::StippleDot;
use crate::stipple::quadtree::{Rect, SpatialIndex};
use image::{Pixel, Rgba, RgbaImage, imageops};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Equally sized RGBA sprites indexed by [`StippleDot::sprite`].
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    sprites: Vec<RgbaImage>,
    width: u32,
    height: u32,
}

impl SpriteSheet {
    pub fn new(sprites: Vec<RgbaImage>) -> Result<Self, StippleError> {
        let first = sprites.first().ok_or(StippleError::EmptySpriteSheet)?;
        let (width, height) = first.dimensions();
        if width == 0 || height == 0 {
            return Err(StippleError::EmptySpriteSheet);
        }
        if let Some(odd) = sprites.iter().find(|s| s.dimensions() != (width, height)) {
            return Err(StippleError::ImageSizeMismatch {
                expected: (width, height),
                found: odd.dimensions(),
            });
        }
        Ok(SpriteSheet {
            sprites,
            width,
            height,
        })
    }

    /// Slice an atlas of `columns × rows` equal cells, row by row.
    pub fn from_atlas(atlas: &RgbaImage, columns: u32, rows: u32) -> Result<Self, StippleError> {
        if columns == 0 || rows == 0 {
            return Err(StippleError::EmptySpriteSheet);
        }
        let (width, height) = (atlas.width() / columns, atlas.height() / rows);
        let sprites = (0..rows)
            .flat_map(|r| (0..columns).map(move |c| (c, r)))
            .map(|(c, r)| imageops::crop_imm(atlas, c * width, r * height, width, height).to_image())
            .collect();
        Self::new(sprites)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub const fn sprite_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sprite(&self, index: u32) -> Option<&RgbaImage> {
        self.sprites.get(index as usize)
    }
}

/// Partition of the canvas into tiles of at most `tile_width × tile_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    canvas: Rect,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    pub fn new(canvas: Rect, tile_width: u32, tile_height: u32) -> Result<Self, StippleError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(StippleError::InvalidConfiguration(
                "tiles must be at least one pixel wide and high".into(),
            ));
        }
        Ok(TileGrid {
            canvas,
            tile_width,
            tile_height,
        })
    }

    /// Tile rows.
    pub const fn rows(&self) -> u32 {
        self.canvas.height().div_ceil(self.tile_height)
    }

    /// Tile columns.
    pub const fn columns(&self) -> u32 {
        self.canvas.width().div_ceil(self.tile_width)
    }

    /// Tile `(i, j)`, clipped to the canvas. Row `i` counts up from the
    /// canvas bottom.
    pub fn tile(&self, i: u32, j: u32) -> Rect {
        let x0 = self.canvas.x0 + (j * self.tile_width) as i32;
        let y0 = self.canvas.y0 + (i * self.tile_height) as i32;
        Rect::new(
            x0,
            y0,
            (x0 + self.tile_width as i32).min(self.canvas.x1),
            (y0 + self.tile_height as i32).min(self.canvas.y1),
        )
    }

    pub fn tiles(&self) -> impl Iterator<Item = Rect> + '_ {
        (0..self.rows()).flat_map(move |i| (0..self.columns()).map(move |j| self.tile(i, j)))
    }
}

/// Draws dots from a [`SpatialIndex`] with a [`SpriteSheet`].
#[derive(Debug, Clone, Copy)]
pub struct TilingCompositor<'a> {
    index: &'a SpatialIndex,
    sprites: &'a SpriteSheet,
}

impl<'a> TilingCompositor<'a> {
    pub const fn new(index: &'a SpatialIndex, sprites: &'a SpriteSheet) -> Self {
        TilingCompositor { index, sprites }
    }

    /// Query padding: the larger sprite side, which covers any sprite whose
    /// centre lies outside a region but whose pixels reach into it.
    pub fn padding(&self) -> i32 {
        let (w, h) = self.sprites.sprite_size();
        w.max(h) as i32
    }

    /// White RGBA buffer of `rect` with every nearby dot composited on top.
    /// Buffer row 0 is the bottom edge of `rect`.
    pub fn render_region(&self, rect: Rect) -> RgbaImage {
        let mut buffer = RgbaImage::from_pixel(rect.width(), rect.height(), Rgba([255, 255, 255, 255]));
        for bucket in self.index.query_padded(rect, self.padding()) {
            for dot in bucket {
                self.draw(&mut buffer, rect, dot);
            }
        }
        buffer
    }

    fn draw(&self, buffer: &mut RgbaImage, rect: Rect, dot: &StippleDot) {
        let Some(sprite) = self.sprites.sprite(dot.sprite) else {
            return;
        };
        let (w, h) = sprite.dimensions();
        let centre = dot.final_position();
        let left = (centre.x - w as Real / 2.0).round() as i64 - i64::from(rect.x0);
        let top = (centre.y + h as Real / 2.0).round() as i64 - i64::from(rect.y0);

        for (sx, sy, pixel) in sprite.enumerate_pixels() {
            let bx = left + i64::from(sx);
            // sprite rows run downward, buffer rows upward
            let by = top - i64::from(sy) - 1;
            if bx < 0 || by < 0 || bx >= i64::from(buffer.width()) || by >= i64::from(buffer.height()) {
                continue;
            }
            buffer.get_pixel_mut(bx as u32, by as u32).blend(pixel);
        }
    }

    /// Render every tile of the grid.
    #[instrument(skip(self))]
    pub fn render_tiles(&self, tile_width: u32, tile_height: u32) -> Result<Vec<(Rect, RgbaImage)>, StippleError> {
        let grid = TileGrid::new(self.index.root_area(), tile_width, tile_height)?;
        let tiles: Vec<Rect> = grid.tiles().collect();
        debug!(tiles = tiles.len(), "rendering tiles");

        #[cfg(feature = "parallel")]
        let rendered: Vec<(Rect, RgbaImage)> = tiles.into_par_iter().map(|t| (t, self.render_region(t))).collect();
        #[cfg(not(feature = "parallel"))]
        let rendered: Vec<(Rect, RgbaImage)> = tiles.into_iter().map(|t| (t, self.render_region(t))).collect();

        Ok(rendered)
    }

    /// Stitch all tiles into one canvas-sized image, top row first.
    #[instrument(skip(self))]
    pub fn export(&self, tile_width: u32, tile_height: u32) -> Result<RgbaImage, StippleError> {
        let canvas = self.index.root_area();
        let mut image = RgbaImage::new(canvas.width(), canvas.height());
        for (tile, pixels) in self.render_tiles(tile_width, tile_height)? {
            imageops::replace(
                &mut image,
                &pixels,
                i64::from(tile.x0 - canvas.x0),
                i64::from(tile.y0 - canvas.y0),
            );
        }
        imageops::flip_vertical_in_place(&mut image);
        Ok(image)
    }

    /// [`TilingCompositor::export`] with the tile size from `configuration`.
    /// Without tile rendering the whole canvas is drawn as one region.
    pub fn export_configured(&self, configuration: &Configuration) -> Result<RgbaImage, StippleError> {
        let (tile_width, tile_height) = if configuration.use_tile_rendering {
            (configuration.tile_width, configuration.tile_height)
        } else {
            let canvas = self.index.root_area();
            (canvas.width().max(1), canvas.height().max(1))
        };
        self.export(tile_width, tile_height)
    }

    #[cfg(feature = "image-io")]
    pub fn save_png(
        &self,
        path: impl AsRef<std::path::Path>,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<(), StippleError> {
        self.export(tile_width, tile_height)?
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
