#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where a square image lands on a page, in page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin: Point,
    pub side: f64,
    pub scale: f64,
}

impl Placement {
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.side / 2.0,
            self.origin.y + self.side / 2.0,
        )
    }
}

/// Page size in PostScript points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub const A4: Self = Self {
        width: 595.276,
        height: 841.89,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Scales a square of `source_side` to `width_ratio` of the page width and
    /// centers it on the page.
    pub fn center_square(&self, source_side: f64, width_ratio: f64) -> Placement {
        let side = self.width * width_ratio;
        Placement {
            origin: Point::new((self.width - side) / 2.0, (self.height - side) / 2.0),
            side,
            scale: side / source_side,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_center_square_on_a4() {
        let placement = PageGeometry::A4.center_square(2048.0, 0.9);
        assert_close(placement.side, 595.276 * 0.9);
        assert_close(placement.scale, placement.side / 2048.0);
        assert_close(placement.origin.x, 595.276 * 0.05);
    }

    #[test]
    fn test_square_center_matches_page_center() {
        let pages = [
            PageGeometry::A4,
            PageGeometry::new(612.0, 792.0),
            PageGeometry::new(1000.0, 300.0),
            PageGeometry::new(1.0, 1.0),
        ];
        for page in pages {
            for side in [16.0, 2048.0, 4096.0] {
                let placed = page.center_square(side, 0.9).center();
                let center = page.center();
                assert_close(placed.x, center.x);
                assert_close(placed.y, center.y);
            }
        }
    }
}
