//! Tile partitioning for the multi-threaded renderer.
//!
//! The image is cut into fixed-size squares, scanned row by row. Edge tiles
//! are clipped to the image.

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of the tile's top-left corner
    pub x: u32,
    /// Y coordinate of the tile's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in claim order
    pub index: usize,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Image coordinates of every pixel, row-major within the tile.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height).flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Number of tiles along each axis.
pub fn tile_count(width: u32, height: u32, tile_size: u32) -> (u32, u32) {
    let size = tile_size.max(1);
    (width.div_ceil(size), height.div_ceil(size))
}

/// Tiles covering a `width` x `height` image, left to right, top to bottom.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let size = tile_size.max(1);
    let (tiles_x, tiles_y) = tile_count(width, height, size);
    let mut tiles = Vec::with_capacity((tiles_x * tiles_y) as usize);

    let mut index = 0;
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = size.min(width - x);
            let th = size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, index));
            index += 1;
            x += size;
        }
        y += size;
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_tiles_exact_fit() {
        let tiles = generate_tiles(128, 128, 32);
        assert_eq!(tiles.len(), 16); // 4x4 grid

        let total_pixels: u32 = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_tiles_partial_fit() {
        let tiles = generate_tiles(100, 70, 32);
        assert_eq!(tile_count(100, 70, 32), (4, 3));
        assert_eq!(tiles.len(), 12);

        let total_pixels: u32 = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 70);

        let last = tiles[tiles.len() - 1];
        assert_eq!((last.x, last.y, last.width, last.height), (96, 64, 4, 6));
    }

    #[test]
    fn test_row_major_order() {
        let tiles = generate_tiles(64, 64, 32);
        let corners: Vec<(u32, u32)> = tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(corners, vec![(0, 0), (32, 0), (0, 32), (32, 32)]);
        assert!(tiles.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn test_tile_pixels_cover_tile_once() {
        let tile = Tile::new(4, 8, 3, 2, 0);
        let pixels: Vec<(u32, u32)> = tile.pixels().collect();
        assert_eq!(pixels, vec![(4, 8), (5, 8), (6, 8), (4, 9), (5, 9), (6, 9)]);
    }

    #[test]
    fn test_empty_image_has_no_tiles() {
        assert!(generate_tiles(0, 10, 32).is_empty());
        assert_eq!(tile_count(0, 0, 32), (0, 0));
    }
}
