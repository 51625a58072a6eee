use earthview_common::Color;
use serde::{Deserialize, Serialize};

/// Output surface parameters: size, clear color, antialiasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
    pub antialias: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            clear_color: Color::WHITE,
            antialias: true,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..Self::default()
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Returns true if the size actually changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_viewport_clears_to_white() {
        let vp = Viewport::default();
        assert_eq!(vp.clear_color, Color::WHITE);
        assert!(vp.antialias);
    }

    #[test]
    fn resize_clamps_to_one_pixel() {
        let mut vp = Viewport::new(800, 600);
        assert!(vp.resize(0, 0));
        assert_eq!((vp.width, vp.height), (1, 1));
        assert!(!vp.resize(1, 1));
    }

    #[test]
    fn aspect_ratio() {
        let vp = Viewport::new(1600, 800);
        assert_eq!(vp.aspect(), 2.0);
    }
}
