use serde::{Deserialize, Serialize};

/// A vertex of a detection polygon in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned integer rectangle, `width`/`height` inclusive of both edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A sticker area reported by a detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StickerRegion {
    pub polygon: Vec<PixelPoint>,
    pub confidence: f32,
}

impl StickerRegion {
    pub fn new(polygon: Vec<PixelPoint>, confidence: f32) -> Self {
        Self { polygon, confidence }
    }

    /// A rectangle covering the full `width` x `height` frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width.saturating_sub(1) as f32, height.saturating_sub(1) as f32);
        Self::new(
            vec![
                PixelPoint::new(0.0, 0.0),
                PixelPoint::new(w, 0.0),
                PixelPoint::new(w, h),
                PixelPoint::new(0.0, h),
            ],
            1.0,
        )
    }

    /// Integer polygon clamped into a `width` x `height` frame, with
    /// consecutive duplicates and a closing vertex removed.
    pub fn clamped_vertices(&self, width: u32, height: u32) -> Vec<(i32, i32)> {
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let max_x = (width - 1) as i32;
        let max_y = (height - 1) as i32;

        let mut out: Vec<(i32, i32)> = Vec::with_capacity(self.polygon.len());
        for p in &self.polygon {
            if !p.x.is_finite() || !p.y.is_finite() {
                continue;
            }
            let v = (
                (p.x as i32).clamp(0, max_x),
                (p.y as i32).clamp(0, max_y),
            );
            if out.last() != Some(&v) {
                out.push(v);
            }
        }
        while out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        out
    }

    /// Bounding rectangle of the clamped polygon, or `None` when it has fewer
    /// than three distinct vertices.
    pub fn bounding_rect(&self, width: u32, height: u32) -> Option<PixelRect> {
        let vertices = self.clamped_vertices(width, height);
        if vertices.len() < 3 {
            return None;
        }
        let min_x = vertices.iter().map(|v| v.0).min()?;
        let max_x = vertices.iter().map(|v| v.0).max()?;
        let min_y = vertices.iter().map(|v| v.1).min()?;
        let max_y = vertices.iter().map(|v| v.1).max()?;
        Some(PixelRect {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_rect_is_inclusive() {
        let region = StickerRegion::new(
            vec![
                PixelPoint::new(2.0, 3.0),
                PixelPoint::new(6.9, 3.0),
                PixelPoint::new(6.0, 8.0),
            ],
            0.9,
        );
        let rect = region.bounding_rect(100, 100).unwrap();
        assert_eq!(rect, PixelRect { x: 2, y: 3, width: 5, height: 6 });
    }

    #[test]
    fn polygon_is_clamped_to_frame() {
        let region = StickerRegion::new(
            vec![
                PixelPoint::new(-5.0, -5.0),
                PixelPoint::new(50.0, 0.0),
                PixelPoint::new(50.0, 50.0),
            ],
            0.9,
        );
        let rect = region.bounding_rect(10, 20).unwrap();
        assert_eq!(rect, PixelRect { x: 0, y: 0, width: 10, height: 20 });
    }

    #[test]
    fn degenerate_polygon_has_no_rect() {
        let region = StickerRegion::new(
            vec![
                PixelPoint::new(1.0, 1.0),
                PixelPoint::new(4.0, 4.0),
                PixelPoint::new(1.0, 1.0),
            ],
            0.9,
        );
        assert!(region.bounding_rect(10, 10).is_none());
    }

    #[test]
    fn full_frame_covers_image() {
        let rect = StickerRegion::full_frame(640, 480).bounding_rect(640, 480).unwrap();
        assert_eq!(rect, PixelRect { x: 0, y: 0, width: 640, height: 480 });
    }
}
