//! Unused and overlapping byte detection.
//!
//! Analyzers that follow offsets (ELF tables, TIFF IFDs) record the
//! `(start, end)` region of everything they tagged. Every region boundary is
//! collected into one flat list together with the file start (an "end" at 0)
//! and the file end (a "start" at `len`), sorted, and read back in pairs.
//! For disjoint regions each pair is `(end of one region, start of the
//! next)`, a gap. When regions overlap, sorting interleaves their boundaries
//! and the pair spans the doubly claimed bytes instead. Either way a
//! non-empty pair is a range worth flagging.

use crate::field::{ColorId, Field};
use std::ops::Range;

/// Name given to every reconciled field
pub const UNUSED_OR_OVERLAPPING: &str = "Unused or overlapping data";

/// Returns the unused or overlapping ranges of a `len`-byte buffer
///
/// Regions are clamped to the buffer, so offsets from malformed files never
/// produce ranges past the end.
pub fn unused_ranges(regions: &[(usize, usize)], len: usize) -> Vec<Range<usize>> {
    let mut points = Vec::with_capacity(regions.len() * 2 + 2);
    points.push(0);
    for &(start, end) in regions {
        let start = start.min(len);
        let end = end.min(len).max(start);
        points.push(start);
        points.push(end);
    }
    points.push(len);
    points.sort_unstable();

    points
        .chunks_exact(2)
        .filter(|pair| pair[0] < pair[1])
        .map(|pair| pair[0]..pair[1])
        .collect()
}

/// Builds the synthetic fields for [`unused_ranges`]
pub fn unused_fields(regions: &[(usize, usize)], len: usize) -> Vec<Field> {
    unused_ranges(regions, len)
        .into_iter()
        .map(|range| {
            Field::new(
                range.start,
                range.end - range.start,
                UNUSED_OR_OVERLAPPING,
                ColorId::Unused,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fully_covered() {
        assert!(unused_ranges(&[(0, 10), (10, 20)], 20).is_empty());
    }

    #[test]
    fn test_gaps() {
        assert_eq!(
            unused_ranges(&[(0, 4), (8, 12)], 16),
            vec![4..8, 12..16]
        );
    }

    #[test]
    fn test_leading_gap() {
        assert_eq!(unused_ranges(&[(4, 8)], 8), vec![0..4]);
    }

    #[test]
    fn test_overlap() {
        assert_eq!(unused_ranges(&[(0, 10), (5, 20)], 20), vec![5..10]);
    }

    #[test]
    fn test_contained_region() {
        assert_eq!(unused_ranges(&[(0, 20), (5, 10)], 20), vec![5..10]);
    }

    #[test]
    fn test_duplicate_region() {
        assert_eq!(unused_ranges(&[(0, 8), (8, 20), (8, 20)], 24), vec![8..20, 20..24]);
    }

    #[test]
    fn test_out_of_bounds_regions_are_clamped() {
        assert_eq!(unused_ranges(&[(0, 4), (50, 90)], 10), vec![4..10]);
        assert_eq!(unused_ranges(&[(0, 4), (6, 90)], 10), vec![4..6]);
    }

    #[test]
    fn test_no_regions() {
        assert_eq!(unused_ranges(&[], 5), vec![0..5]);
        assert!(unused_ranges(&[], 0).is_empty());
    }

    #[test]
    fn test_unused_fields() {
        let fields = unused_fields(&[(0, 4)], 6);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].range(), 4..6);
        assert_eq!(fields[0].name, UNUSED_OR_OVERLAPPING);
        assert_eq!(fields[0].color, ColorId::Unused);
    }
}
