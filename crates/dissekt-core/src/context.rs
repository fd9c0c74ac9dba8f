//! Per-analysis state shared by the format analyzers.
//!
//! A [`Context`] bundles the cursor, the field sink, the description tabs and
//! the decoder for exactly one [`crate::Dissector::analyze`] call. It is
//! created, walked and consumed by [`Context::finish`]; nothing survives the
//! call.

use crate::cursor::{Cursor, Endian, Offset};
use crate::dispatch::{DissectorConfig, Format};
use crate::error::Result;
use crate::field::{ColorId, Field};
use crate::inflate::Inflater;
use crate::reconcile;
use crate::report::{Analysis, EmbeddedFile, Tab};
use crate::sink::FieldSink;
use std::borrow::Cow;

/// Name of the terminal field emitted when a walk cannot continue
pub(crate) const UNRECOGNIZED: &str = "Unrecognized data";

pub(crate) struct Context<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) sink: FieldSink,
    pub(crate) inflater: &'a dyn Inflater,
    pub(crate) config: &'a DissectorConfig,
    tabs: Vec<Tab>,
    embedded: Vec<EmbeddedFile>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        inflater: &'a dyn Inflater,
        config: &'a DissectorConfig,
    ) -> Self {
        Self {
            cursor: Cursor::new(data),
            sink: FieldSink::new(),
            inflater,
            config,
            tabs: Vec::new(),
            embedded: Vec::new(),
        }
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        self.cursor.data()
    }

    pub(crate) fn len(&self) -> usize {
        self.cursor.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor.position()
    }

    pub(crate) fn emit(&mut self, field: Field) {
        self.sink.emit(field);
    }

    /// Records `start..end`, clamped to the buffer, as a tagged region
    pub(crate) fn mark_region(&mut self, start: usize, end: usize) {
        let len = self.len();
        self.sink.mark_region(start.min(len), end.min(len));
    }

    /// Reads `n` bytes, tags them and advances past them
    pub(crate) fn take(
        &mut self,
        n: usize,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Result<&'a [u8]> {
        let bytes = self.cursor.read(n)?;
        self.sink
            .emit(Field::new(self.cursor.position(), n, name, color));
        self.cursor.advance(n);
        Ok(bytes)
    }

    /// Like [`Context::take`], with a navigation label on the field
    pub(crate) fn take_nav(
        &mut self,
        n: usize,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
        navigation: impl Into<String>,
    ) -> Result<&'a [u8]> {
        let bytes = self.cursor.read(n)?;
        self.sink.emit(
            Field::new(self.cursor.position(), n, name, color).with_navigation(navigation),
        );
        self.cursor.advance(n);
        Ok(bytes)
    }

    pub(crate) fn take_array<const N: usize>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Result<[u8; N]> {
        let bytes = self.cursor.read_array::<N>()?;
        self.sink
            .emit(Field::new(self.cursor.position(), N, name, color));
        self.cursor.advance(N);
        Ok(bytes)
    }

    pub(crate) fn take_u8(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Result<u8> {
        Ok(self.take_array::<1>(name, color)?[0])
    }

    pub(crate) fn take_u16(
        &mut self,
        endian: Endian,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Result<u16> {
        Ok(endian.u16(self.take_array(name, color)?))
    }

    pub(crate) fn take_u32(
        &mut self,
        endian: Endian,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Result<u32> {
        Ok(endian.u32(self.take_array(name, color)?))
    }

    pub(crate) fn take_u64(
        &mut self,
        endian: Endian,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) -> Result<u64> {
        Ok(endian.u64(self.take_array(name, color)?))
    }

    /// Tags everything from the cursor up to `end` (clamped to the buffer)
    /// and moves the cursor there
    pub(crate) fn tag_until(
        &mut self,
        end: usize,
        name: impl Into<Cow<'static, str>>,
        color: ColorId,
    ) {
        let start = self.position();
        let end = end.min(self.len());
        if end > start {
            self.sink.emit(Field::new(start, end - start, name, color));
            self.cursor.set_position(end);
        }
    }

    /// Tags everything from the cursor to the end of the buffer
    pub(crate) fn tag_remaining(&mut self, name: impl Into<Cow<'static, str>>, color: ColorId) {
        self.tag_until(self.len(), name, color);
    }

    /// Ends a walk: tags `at..len` as unrecognized data
    pub(crate) fn terminate(&mut self, at: usize) {
        let len = self.len();
        let at = at.min(len);
        if at < len {
            self.sink
                .emit(Field::new(at, len - at, UNRECOGNIZED, ColorId::Error));
            self.mark_region(at, len);
        }
        self.cursor.set_position(len);
    }

    /// Runs `f` with the cursor at `offset`, then puts the cursor back
    ///
    /// The position is restored however `f` returns, including errors.
    pub(crate) fn detour<T>(&mut self, offset: Offset, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.cursor.position();
        self.cursor.set_position(offset.get());
        let out = f(self);
        self.cursor.set_position(saved);
        out
    }

    /// Like [`Context::detour`], recording `offset..final position` as a
    /// tagged region whether or not `f` succeeds
    pub(crate) fn detour_region<T>(
        &mut self,
        offset: Offset,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.detour(offset, |ctx| {
            let out = f(ctx);
            let end = ctx.position();
            ctx.mark_region(offset.get(), end);
            out
        })
    }

    /// Runs `f` with reads limited to `..end`
    ///
    /// Offsets stay absolute; a read crossing `end` fails as an underrun at
    /// the offset it started from.
    pub(crate) fn bounded<T>(&mut self, end: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        let full = self.cursor.data();
        let mut limited = Cursor::new(&full[..end.min(full.len())]);
        limited.set_position(self.cursor.position());
        self.cursor = limited;

        let out = f(self);

        let position = self.cursor.position();
        self.cursor = Cursor::new(full);
        self.cursor.set_position(position);
        out
    }

    /// Description tab with `title`, created on first use
    pub(crate) fn tab(&mut self, title: &str) -> &mut Tab {
        let index = match self.tabs.iter().position(|tab| tab.title == title) {
            Some(index) => index,
            None => {
                self.tabs.push(Tab::new(title));
                self.tabs.len() - 1
            }
        };
        &mut self.tabs[index]
    }

    /// Registers a sub-range holding a file of its own
    pub(crate) fn embed(&mut self, offset: usize, length: usize, description: impl Into<String>) {
        self.embedded.push(EmbeddedFile {
            offset,
            length,
            description: description.into(),
        });
    }

    /// Sorts the fields, fills in unused ranges when asked to, and hands
    /// everything back as an [`Analysis`]
    pub(crate) fn finish(self, format: Format, reconcile: bool) -> Analysis {
        let len = self.len();
        let (mut fields, regions) = self.sink.into_parts();
        if reconcile {
            fields.extend(reconcile::unused_fields(&regions, len));
        }
        fields.sort_by_key(|field| field.offset);

        Analysis {
            format,
            fields,
            tabs: self.tabs,
            embedded: self.embedded,
            reconciled: reconcile,
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::inflate::DeflateInflater;
    use pretty_assertions::assert_eq;

    fn with_context<T>(data: &[u8], f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let inflater = DeflateInflater::default();
        let config = DissectorConfig::default();
        let mut ctx = Context::new(data, &inflater, &config);
        f(&mut ctx)
    }

    #[test]
    fn test_take_emits_and_advances() {
        with_context(&[0x12, 0x34, 0x56], |ctx| {
            assert_eq!(ctx.take_u16(Endian::Big, "Word", ColorId::Accent1).unwrap(), 0x1234);
            assert_eq!(ctx.position(), 2);
            assert_eq!(ctx.sink.fields()[0].range(), 0..2);
            assert!(ctx.take_u16(Endian::Big, "Word", ColorId::Accent1).is_err());
            assert_eq!(ctx.position(), 2);
            assert_eq!(ctx.sink.fields().len(), 1);
        });
    }

    #[test]
    fn test_detour_restores_on_error() {
        with_context(&[0; 8], |ctx| {
            ctx.cursor.advance(3);
            let result: Result<()> = ctx.detour(Offset(6), |ctx| {
                ctx.take(1, "ok", ColorId::Accent1)?;
                ctx.take(4, "too long", ColorId::Accent1)?;
                Ok(())
            });
            assert!(matches!(result, Err(Error::Underrun { offset: 7, .. })));
            assert_eq!(ctx.position(), 3);
        });
    }

    #[test]
    fn test_detour_region_marks_partial_progress() {
        with_context(&[0; 8], |ctx| {
            let _ = ctx.detour_region(Offset(2), |ctx| {
                ctx.take(3, "part", ColorId::Accent1)?;
                ctx.take(9, "fails", ColorId::Accent1)?;
                Ok(())
            });
            assert_eq!(ctx.sink.regions(), &[(2, 5)]);
        });
    }

    #[test]
    fn test_bounded_limits_reads() {
        with_context(&[0; 10], |ctx| {
            ctx.cursor.advance(2);
            let result = ctx.bounded(6, |ctx| {
                ctx.take(3, "inside", ColorId::Accent1)?;
                assert_eq!(ctx.len(), 6);
                ctx.take(2, "crossing", ColorId::Accent1)
            });
            assert_eq!(result, Err(Error::underrun(5, 2, 6)));
            assert_eq!(ctx.position(), 5);
            assert_eq!(ctx.len(), 10);
            assert!(ctx.take(2, "after", ColorId::Accent1).is_ok());
        });
    }

    #[test]
    fn test_terminate() {
        with_context(&[0; 8], |ctx| {
            ctx.terminate(5);
            assert_eq!(ctx.sink.fields()[0].range(), 5..8);
            assert_eq!(ctx.sink.fields()[0].name, UNRECOGNIZED);
            ctx.terminate(20);
            assert_eq!(ctx.sink.fields().len(), 1);
        });
    }

    #[test]
    fn test_finish_reconciles_and_sorts() {
        let inflater = DeflateInflater::default();
        let config = DissectorConfig::default();
        let mut ctx = Context::new(&[0; 10], &inflater, &config);
        ctx.emit(Field::new(6, 2, "late", ColorId::Accent2));
        ctx.emit(Field::new(0, 2, "early", ColorId::Accent1));
        ctx.mark_region(0, 2);
        ctx.mark_region(6, 8);
        let analysis = ctx.finish(Format::Unknown, true);

        let ranges: Vec<_> = analysis.fields.iter().map(Field::range).collect();
        assert_eq!(ranges, vec![0..2, 2..6, 6..8, 8..10]);
        assert!(analysis.uncovered().is_empty());
    }

    #[test]
    fn test_tab_reuse() {
        with_context(&[], |ctx| {
            ctx.tab("Header").entry("a", "1");
            ctx.tab("Other");
            ctx.tab("Header").entry("b", "2");
            assert_eq!(ctx.tabs.len(), 2);
            assert_eq!(ctx.tabs[0].lines.len(), 2);
        });
    }
}
