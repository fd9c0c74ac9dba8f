//! Analysis output: fields, description tabs and embedded files.

use crate::dispatch::Format;
use crate::field::Field;
use std::ops::Range;

/// One line of a description tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Heading that groups the lines below it
    Section(String),
    /// Decoded value of a structure
    Entry {
        /// What the value is
        key: String,
        /// Rendered value
        value: String,
        /// Longer explanation
        tooltip: Option<String>,
    },
    /// Raw text payload (PNG text chunks, TIFF strings, pax records)
    Text(String),
    /// A format invariant the file violates
    Warning(String),
}

/// Titled list of description lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    /// Title shown to the user
    pub title: String,
    /// Lines in insertion order
    pub lines: Vec<Line>,
}

impl Tab {
    /// Creates an empty tab
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    /// Appends a section heading
    pub fn section(&mut self, title: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Section(title.into()));
        self
    }

    /// Appends a key/value entry
    pub fn entry(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Entry {
            key: key.into(),
            value: value.into(),
            tooltip: None,
        });
        self
    }

    /// Appends a key/value entry with a tooltip
    pub fn entry_with_tooltip(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> &mut Self {
        self.lines.push(Line::Entry {
            key: key.into(),
            value: value.into(),
            tooltip: Some(tooltip.into()),
        });
        self
    }

    /// Appends a text payload
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Text(text.into()));
        self
    }

    /// Appends a warning
    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Warning(message.into()));
        self
    }

    /// Value of the first entry with `key`
    pub fn value(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// All warnings in this tab
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Warning(message) => Some(message.as_str()),
            _ => None,
        })
    }
}

/// A byte range holding a complete file of its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    /// Start offset in the analyzed buffer
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// What the range contains
    pub description: String,
}

impl EmbeddedFile {
    /// Byte range of the embedded file
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }
}

/// Complete result of analyzing one buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Detected format
    pub format: Format,
    /// Fields sorted by offset
    pub fields: Vec<Field>,
    /// Description tabs
    pub tabs: Vec<Tab>,
    /// Sub-ranges that can be analyzed on their own
    pub embedded: Vec<EmbeddedFile>,
    /// Whether unused/overlapping ranges were filled in
    pub reconciled: bool,
    /// Length of the analyzed buffer
    pub len: usize,
}

impl Analysis {
    /// Tab with the given title
    pub fn tab(&self, title: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.title == title)
    }

    /// Fields carrying an error color
    pub fn error_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_error())
    }

    /// Fields with the given name
    pub fn fields_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Field> + 's {
        self.fields.iter().filter(move |field| field.name == name)
    }

    /// Every warning across all tabs
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.tabs.iter().flat_map(|tab| tab.warnings())
    }

    /// Byte ranges no field covers
    pub fn uncovered(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = self.fields.iter().map(Field::range).collect();
        ranges.sort_by_key(|range| range.start);

        let mut gaps = Vec::new();
        let mut covered = 0;
        for range in ranges {
            if range.start > covered {
                gaps.push(covered..range.start.min(self.len));
            }
            covered = covered.max(range.end);
            if covered >= self.len {
                break;
            }
        }
        if covered < self.len {
            gaps.push(covered..self.len);
        }
        gaps.retain(|gap| !gap.is_empty());
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ColorId;
    use pretty_assertions::assert_eq;

    fn analysis(fields: Vec<Field>, len: usize) -> Analysis {
        Analysis {
            format: Format::Unknown,
            fields,
            tabs: Vec::new(),
            embedded: Vec::new(),
            reconciled: false,
            len,
        }
    }

    #[test]
    fn test_tab_lookup() {
        let mut tab = Tab::new("Header");
        tab.section("Identity").entry("Class", "ELF64").warning("odd");
        assert_eq!(tab.value("Class"), Some("ELF64"));
        assert_eq!(tab.value("Missing"), None);
        assert_eq!(tab.warnings().collect::<Vec<_>>(), vec!["odd"]);
    }

    #[test]
    fn test_uncovered() {
        let a = analysis(
            vec![
                Field::new(0, 4, "a", ColorId::Accent1),
                Field::new(2, 4, "b", ColorId::Accent2),
                Field::new(8, 2, "c", ColorId::Accent3),
            ],
            12,
        );
        assert_eq!(a.uncovered(), vec![6..8, 10..12]);
    }

    #[test]
    fn test_fully_covered() {
        let a = analysis(vec![Field::new(0, 3, "a", ColorId::Accent1)], 3);
        assert!(a.uncovered().is_empty());
    }
}
