//! Annotated byte ranges produced by the analyzers.

use std::borrow::Cow;
use std::ops::Range;

/// Semantic color slot of a field
///
/// The core only decides which slot a field belongs to. How a slot is drawn
/// is up to the presentation layer, see [`crate::Palette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorId {
    /// First rotating accent
    Accent1,
    /// Second rotating accent
    Accent2,
    /// Third rotating accent
    Accent3,
    /// Fourth rotating accent
    Accent4,
    /// Fifth rotating accent
    Accent5,
    /// Sixth rotating accent
    Accent6,
    /// Seventh rotating accent
    Accent7,
    /// Eighth rotating accent
    Accent8,
    /// Invalid or unrecognized data
    Error,
    /// Second error shade, used to tell adjacent error spans apart
    ErrorAlt,
    /// Bytes no structure accounts for, or that several structures claim
    Unused,
}

impl ColorId {
    /// The eight accent slots in rotation order
    pub const ACCENTS: [ColorId; 8] = [
        ColorId::Accent1,
        ColorId::Accent2,
        ColorId::Accent3,
        ColorId::Accent4,
        ColorId::Accent5,
        ColorId::Accent6,
        ColorId::Accent7,
        ColorId::Accent8,
    ];

    /// Every slot, in palette order
    pub const ALL: [ColorId; 11] = [
        ColorId::Accent1,
        ColorId::Accent2,
        ColorId::Accent3,
        ColorId::Accent4,
        ColorId::Accent5,
        ColorId::Accent6,
        ColorId::Accent7,
        ColorId::Accent8,
        ColorId::Error,
        ColorId::ErrorAlt,
        ColorId::Unused,
    ];

    /// Accent slot `index`, wrapping around
    pub fn accent(index: usize) -> ColorId {
        Self::ACCENTS[index % Self::ACCENTS.len()]
    }

    /// Returns true for the two error shades
    pub fn is_error(self) -> bool {
        matches!(self, ColorId::Error | ColorId::ErrorAlt)
    }

    /// Position in [`ColorId::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Hands out accent slots in rotation
#[derive(Debug, Default, Clone)]
pub(crate) struct ColorCycle(usize);

impl ColorCycle {
    pub(crate) fn new() -> Self {
        Self(0)
    }

    pub(crate) fn next_color(&mut self) -> ColorId {
        let color = ColorId::accent(self.0);
        self.0 += 1;
        color
    }
}

/// One named, colored, byte-exact span of the analyzed buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Start offset in the buffer
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Display name
    pub name: Cow<'static, str>,
    /// Color slot
    pub color: ColorId,
    /// Label for a navigation list, if the field is a jump target
    pub navigation: Option<String>,
    /// Color of every byte but the first, for split highlighting
    pub secondary_color: Option<ColorId>,
}

impl Field {
    /// Creates a field without navigation label or secondary color
    pub fn new(
        offset: usize,
        length: usize,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Self {
        Self {
            offset,
            length,
            name: name.into(),
            color,
            navigation: None,
            secondary_color: None,
        }
    }

    /// Sets the navigation label
    pub fn with_navigation(mut self, label: impl Into<String>) -> Self {
        self.navigation = Some(label.into());
        self
    }

    /// Sets the secondary color
    pub fn with_secondary_color(mut self, color: ColorId) -> Self {
        self.secondary_color = Some(color);
        self
    }

    /// One past the last byte
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Byte range covered by the field
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Returns true if the field carries an error color
    pub fn is_error(&self) -> bool {
        self.color.is_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_rotation() {
        assert_eq!(ColorId::accent(0), ColorId::Accent1);
        assert_eq!(ColorId::accent(9), ColorId::Accent2);
    }

    #[test]
    fn test_index_matches_all() {
        for (i, color) in ColorId::ALL.iter().enumerate() {
            assert_eq!(color.index(), i);
        }
    }

    #[test]
    fn test_field_builder() {
        let field = Field::new(4, 2, "Class", ColorId::Accent2)
            .with_navigation("class")
            .with_secondary_color(ColorId::Accent3);
        assert_eq!(field.range(), 4..6);
        assert_eq!(field.navigation.as_deref(), Some("class"));
        assert_eq!(field.secondary_color, Some(ColorId::Accent3));
        assert!(!field.is_error());
    }
}
