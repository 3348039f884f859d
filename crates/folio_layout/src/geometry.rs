//! Rectangles and the scrolling viewport

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

/// The visible window onto the page
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Vertical scroll offset of the page
    pub scroll_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            scroll_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
        }
    }

    pub fn scrolled_to(mut self, scroll_y: f32) -> Self {
        self.scroll_y = scroll_y.max(0.0);
        self
    }

    /// Visible region in page coordinates
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.width, self.height)
    }

    /// Fraction (0..=1) of `target` inside the viewport
    ///
    /// Zero-area targets count as fully visible when they lie inside the
    /// viewport, matching how browsers report empty elements.
    pub fn intersection_ratio(&self, target: &Rect) -> f32 {
        let bounds = self.bounds();
        if target.area() == 0.0 {
            let inside = target.x >= bounds.x
                && target.x <= bounds.right()
                && target.y >= bounds.y
                && target.y <= bounds.bottom();
            return if inside { 1.0 } else { 0.0 };
        }
        bounds
            .intersection(target)
            .map(|overlap| (overlap.area() / target.area()).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
        assert_eq!(a.intersection(&Rect::new(100.0, 0.0, 10.0, 10.0)), None);
    }

    #[test]
    fn test_intersection_ratio_follows_scroll() {
        let section = Rect::new(0.0, 700.0, 1280.0, 200.0);
        let viewport = Viewport::new(1280.0, 720.0);
        assert!((viewport.intersection_ratio(&section) - 0.1).abs() < 1e-6);

        let scrolled = viewport.scrolled_to(300.0);
        assert_eq!(scrolled.intersection_ratio(&section), 1.0);

        let past = viewport.scrolled_to(2000.0);
        assert_eq!(past.intersection_ratio(&section), 0.0);
    }

    #[test]
    fn test_empty_rect_ratio() {
        let viewport = Viewport::new(100.0, 100.0);
        assert_eq!(viewport.intersection_ratio(&Rect::new(10.0, 10.0, 0.0, 0.0)), 1.0);
        assert_eq!(viewport.intersection_ratio(&Rect::new(10.0, 500.0, 0.0, 0.0)), 0.0);
    }
}
