//! Presentation mapping for [`ColorId`] slots.
//!
//! The analyzers never touch a palette. Front ends build one (or take the
//! default) and look colors up when drawing fields.

use crate::field::ColorId;

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its components
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` notation
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Read-only mapping from color slot to display color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; 11],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [
                Rgb::new(0x62, 0xa0, 0xea),
                Rgb::new(0x57, 0xe3, 0x89),
                Rgb::new(0xf8, 0xe4, 0x5c),
                Rgb::new(0xff, 0xa3, 0x48),
                Rgb::new(0xdc, 0x8a, 0xdd),
                Rgb::new(0x99, 0xc1, 0xf1),
                Rgb::new(0x8f, 0xf0, 0xa4),
                Rgb::new(0xcd, 0xab, 0x8f),
                Rgb::new(0xed, 0x33, 0x3b),
                Rgb::new(0xc0, 0x1c, 0x28),
                Rgb::new(0x9a, 0x99, 0x96),
            ],
        }
    }
}

impl Palette {
    /// Creates the default palette
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides one slot
    pub fn with_color(mut self, id: ColorId, rgb: Rgb) -> Self {
        self.colors[id.index()] = rgb;
        self
    }

    /// Color for a slot
    pub fn rgb(&self, id: ColorId) -> Rgb {
        self.colors[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override() {
        let palette = Palette::new().with_color(ColorId::Unused, Rgb::new(1, 2, 3));
        assert_eq!(palette.rgb(ColorId::Unused), Rgb::new(1, 2, 3));
        assert_ne!(palette.rgb(ColorId::Error), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb::new(0xed, 0x33, 0x3b).hex(), "#ed333b");
    }
}
