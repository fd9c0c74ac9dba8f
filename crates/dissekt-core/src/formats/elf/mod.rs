//! ELF analyzer.
//!
//! ## Walk
//!
//! 1. The fixed file header. The class byte picks 4- or 8-byte addresses,
//!    the encoding byte picks the byte order for everything after it.
//! 2. The program header table, one fixed-size entry per segment.
//! 3. The section header table. Section names live in the string table
//!    section `e_shstrndx`, whose file offset is read ahead of the walk.
//!    Every section with file-backed data gets that data tagged.
//!
//! Tables are reached by offset, so each walk records the region it covered
//! and gaps are filled in afterwards. Any read past the end of the buffer
//! stops the analysis with a single "Unrecognized data" field.

mod tables;

use crate::context::Context;
use crate::cursor::{c_string_at, Endian, Offset};
use crate::error::{Error, Result};
use crate::field::{ColorId, Field};
use crate::formats::{describe_flags, lookup};
use tables::*;
use tracing::{debug, trace};

/// ELF magic number at offset 0
pub const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

const HEADER_TAB: &str = "Header";
const PROGRAM_TAB: &str = "Program headers";
const SECTION_TAB: &str = "Sections";

/// Returns true if `data` starts with the ELF magic number
pub fn matches(data: &[u8]) -> bool {
    data.starts_with(&MAGIC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Elf32,
    Elf64,
}

impl Class {
    fn word_size(self) -> usize {
        match self {
            Class::Elf32 => 4,
            Class::Elf64 => 8,
        }
    }

    fn header_size(self) -> u16 {
        match self {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    fn program_entry_size(self) -> usize {
        match self {
            Class::Elf32 => 32,
            Class::Elf64 => 56,
        }
    }

    fn section_entry_size(self) -> usize {
        match self {
            Class::Elf32 => 40,
            Class::Elf64 => 64,
        }
    }

    /// Offset of `sh_offset` inside a section header entry
    fn section_offset_field(self) -> usize {
        match self {
            Class::Elf32 => 16,
            Class::Elf64 => 24,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Class::Elf32 => "32-bit objects",
            Class::Elf64 => "64-bit objects",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    class: Class,
    endian: Endian,
    os_abi: u8,
    abi_version: u8,
    object_type: u16,
    machine: u16,
    version: u32,
    entry: u64,
    ph_offset: u64,
    sh_offset: u64,
    flags: u32,
    header_size: u16,
    ph_entry_size: u16,
    ph_count: u16,
    sh_entry_size: u16,
    sh_count: u16,
    sh_names_index: u16,
}

impl Header {
    /// Distance between program header entries, at least the class layout
    fn program_stride(&self) -> usize {
        usize::from(self.ph_entry_size).max(self.class.program_entry_size())
    }

    fn section_stride(&self) -> usize {
        usize::from(self.sh_entry_size).max(self.class.section_entry_size())
    }
}

pub(crate) fn analyze(ctx: &mut Context<'_>) {
    if let Err(err) = walk(ctx) {
        debug!("ELF analysis stopped: {}", err);
        let at = err.offset().unwrap_or_else(|| ctx.position());
        ctx.tab(HEADER_TAB).warning(err.to_string());
        ctx.terminate(at);
    }
}

fn walk(ctx: &mut Context<'_>) -> Result<()> {
    let header = read_header(ctx);
    let header_end = ctx.position();
    ctx.mark_region(0, header_end);
    let header = header?;

    describe_header(ctx, &header);
    program_headers(ctx, &header)?;
    section_headers(ctx, &header)?;
    Ok(())
}

/// Reads an address-sized value: 4 bytes for ELF32, 8 for ELF64
fn take_word(
    ctx: &mut Context<'_>,
    header_class: Class,
    endian: Endian,
    name: &'static str,
    color: ColorId,
) -> Result<u64> {
    match header_class {
        Class::Elf32 => Ok(u64::from(ctx.take_u32(endian, name, color)?)),
        Class::Elf64 => ctx.take_u64(endian, name, color),
    }
}

fn read_header(ctx: &mut Context<'_>) -> Result<Header> {
    ctx.cursor.read(MAGIC.len())?;
    ctx.emit(
        Field::new(0, MAGIC.len(), "ELF signature", ColorId::Accent1)
            .with_secondary_color(ColorId::Accent2),
    );
    ctx.cursor.advance(MAGIC.len());

    let class = match ctx.cursor.read_array::<1>()?[0] {
        1 => Class::Elf32,
        2 => Class::Elf64,
        other => {
            ctx.take(1, "Invalid class", ColorId::Error)?;
            return Err(Error::malformed(ctx.position(), format!("invalid ELF class {other}")));
        }
    };
    ctx.take(1, "Class", ColorId::Accent2)?;

    let endian = match ctx.cursor.read_array::<1>()?[0] {
        1 => Endian::Little,
        2 => Endian::Big,
        other => {
            ctx.take(1, "Invalid data encoding", ColorId::Error)?;
            return Err(Error::malformed(
                ctx.position(),
                format!("invalid ELF data encoding {other}"),
            ));
        }
    };
    ctx.take(1, "Data encoding", ColorId::Accent3)?;

    ctx.take_u8("ELF identification version", ColorId::Accent4)?;
    let os_abi = ctx.take_u8("OS ABI", ColorId::Accent5)?;
    let abi_version = ctx.take_u8("ABI version", ColorId::Accent6)?;
    ctx.take(7, "Padding", ColorId::Accent7)?;

    let object_type = ctx.take_u16(endian, "Object type", ColorId::Accent1)?;
    let machine = ctx.take_u16(endian, "Machine", ColorId::Accent2)?;
    let version = ctx.take_u32(endian, "Object file version", ColorId::Accent3)?;
    let entry = take_word(ctx, class, endian, "Entry point", ColorId::Accent4)?;
    let ph_offset = take_word(ctx, class, endian, "Program header table offset", ColorId::Accent5)?;
    let sh_offset = take_word(ctx, class, endian, "Section header table offset", ColorId::Accent6)?;
    let flags = ctx.take_u32(endian, "Processor-specific flags", ColorId::Accent7)?;
    let header_size = ctx.take_u16(endian, "ELF header size", ColorId::Accent8)?;
    let ph_entry_size = ctx.take_u16(endian, "Program header entry size", ColorId::Accent1)?;
    let ph_count = ctx.take_u16(endian, "Program header entries", ColorId::Accent2)?;
    let sh_entry_size = ctx.take_u16(endian, "Section header entry size", ColorId::Accent3)?;
    let sh_count = ctx.take_u16(endian, "Section header entries", ColorId::Accent4)?;
    let sh_names_index = ctx.take_u16(endian, "Section names index", ColorId::Accent5)?;

    Ok(Header {
        class,
        endian,
        os_abi,
        abi_version,
        object_type,
        machine,
        version,
        entry,
        ph_offset,
        sh_offset,
        flags,
        header_size,
        ph_entry_size,
        ph_count,
        sh_entry_size,
        sh_count,
        sh_names_index,
    })
}

fn describe_header(ctx: &mut Context<'_>, h: &Header) {
    let tab = ctx.tab(HEADER_TAB);
    tab.section("ELF identification")
        .entry("Class", h.class.label())
        .entry("Data encoding", h.endian.as_str())
        .entry(
            "OS ABI",
            lookup(h.os_abi, OS_ABIS)
                .map_or_else(|| format!("Unknown ({})", h.os_abi), str::to_string),
        )
        .entry("ABI version", h.abi_version.to_string());

    tab.section("File header")
        .entry(
            "Object type",
            match h.object_type {
                0xFE00..=0xFEFF => "OS-specific".to_string(),
                0xFF00..=0xFFFF => "Processor-specific".to_string(),
                other => lookup(other, OBJECT_TYPES)
                    .map_or_else(|| format!("Unknown ({other})"), str::to_string),
            },
        )
        .entry(
            "Machine",
            lookup(h.machine, MACHINES)
                .map_or_else(|| format!("Unknown ({})", h.machine), str::to_string),
        )
        .entry("Object file version", h.version.to_string())
        .entry("Entry point", format!("0x{:x}", h.entry))
        .entry("Program header table offset", h.ph_offset.to_string())
        .entry("Section header table offset", h.sh_offset.to_string())
        .entry("Processor-specific flags", format!("0x{:x}", h.flags))
        .entry("ELF header size", h.header_size.to_string())
        .entry("Program header entry size", h.ph_entry_size.to_string())
        .entry("Program header entries", h.ph_count.to_string())
        .entry("Section header entry size", h.sh_entry_size.to_string())
        .entry("Section header entries", h.sh_count.to_string())
        .entry("Section names index", h.sh_names_index.to_string());

    if h.header_size != h.class.header_size() {
        tab.warning(format!(
            "ELF header size is {} bytes, expected {}",
            h.header_size,
            h.class.header_size()
        ));
    }
    if h.ph_count > 0 && usize::from(h.ph_entry_size) != h.class.program_entry_size() {
        tab.warning(format!(
            "Program header entry size is {} bytes, expected {}",
            h.ph_entry_size,
            h.class.program_entry_size()
        ));
    }
    if h.sh_count > 0 && usize::from(h.sh_entry_size) != h.class.section_entry_size() {
        tab.warning(format!(
            "Section header entry size is {} bytes, expected {}",
            h.sh_entry_size,
            h.class.section_entry_size()
        ));
    }
}

fn program_headers(ctx: &mut Context<'_>, h: &Header) -> Result<()> {
    if h.ph_offset == 0 || h.ph_count == 0 {
        return Ok(());
    }
    trace!("Walking {} program headers at {}", h.ph_count, h.ph_offset);

    ctx.detour_region(Offset::from_u64(h.ph_offset), |ctx| {
        let padding = h.program_stride() - h.class.program_entry_size();
        for index in 0..h.ph_count {
            program_header(ctx, h, index)?;
            ctx.take(padding, "Entry padding", ColorId::Unused)?;
        }
        Ok(())
    })
}

fn program_header(ctx: &mut Context<'_>, h: &Header, index: u16) -> Result<()> {
    let e = h.endian;
    let class = h.class;
    let label = format!("Program header {index}");

    let segment_type = e.u32(ctx.cursor.read_array::<4>()?);
    ctx.take_nav(4, "Segment type", ColorId::Accent1, label.clone())?;

    let flags;
    let offset;
    let vaddr;
    let paddr;
    let file_size;
    let mem_size;
    let align;
    match class {
        Class::Elf32 => {
            offset = take_word(ctx, class, e, "Segment offset", ColorId::Accent3)?;
            vaddr = take_word(ctx, class, e, "Virtual address", ColorId::Accent4)?;
            paddr = take_word(ctx, class, e, "Physical address", ColorId::Accent5)?;
            file_size = take_word(ctx, class, e, "Segment file size", ColorId::Accent6)?;
            mem_size = take_word(ctx, class, e, "Segment memory size", ColorId::Accent7)?;
            flags = ctx.take_u32(e, "Segment flags", ColorId::Accent2)?;
            align = take_word(ctx, class, e, "Segment alignment", ColorId::Accent8)?;
        }
        Class::Elf64 => {
            flags = ctx.take_u32(e, "Segment flags", ColorId::Accent2)?;
            offset = take_word(ctx, class, e, "Segment offset", ColorId::Accent3)?;
            vaddr = take_word(ctx, class, e, "Virtual address", ColorId::Accent4)?;
            paddr = take_word(ctx, class, e, "Physical address", ColorId::Accent5)?;
            file_size = take_word(ctx, class, e, "Segment file size", ColorId::Accent6)?;
            mem_size = take_word(ctx, class, e, "Segment memory size", ColorId::Accent7)?;
            align = take_word(ctx, class, e, "Segment alignment", ColorId::Accent8)?;
        }
    }

    let type_name = match segment_type {
        0x6000_0000..=0x6FFF_FFFF => "OS-specific".to_string(),
        0x7000_0000..=0x7FFF_FFFF => "Processor-specific".to_string(),
        other => lookup(other, SEGMENT_TYPES)
            .map_or_else(|| format!("Unknown ({other})"), str::to_string),
    };

    ctx.tab(PROGRAM_TAB)
        .section(label)
        .entry("Segment type", type_name)
        .entry("Segment flags", describe_flags(u64::from(flags), SEGMENT_FLAGS))
        .entry("Segment offset", offset.to_string())
        .entry("Virtual address", format!("0x{vaddr:x}"))
        .entry("Physical address", format!("0x{paddr:x}"))
        .entry("Segment file size", file_size.to_string())
        .entry("Segment memory size", mem_size.to_string())
        .entry("Segment alignment", align.to_string());
    Ok(())
}

/// File offset of the section name string table, read ahead from entry
/// `e_shstrndx` of the section header table
fn names_table_offset(ctx: &Context<'_>, h: &Header) -> Option<usize> {
    let index = usize::from(h.sh_names_index);
    if index == 0 || index >= usize::from(h.sh_count) {
        return None;
    }
    let at = Offset::from_u64(h.sh_offset)
        .get()
        .checked_add(index.checked_mul(h.section_stride())?)?
        .checked_add(h.class.section_offset_field())?;
    let bytes = ctx.cursor.read_at(Offset(at), h.class.word_size()).ok()?;
    let offset = match h.class {
        Class::Elf32 => u64::from(h.endian.u32_at(bytes, 0)),
        Class::Elf64 => h.endian.u64(bytes.try_into().ok()?),
    };
    usize::try_from(offset).ok()
}

fn section_headers(ctx: &mut Context<'_>, h: &Header) -> Result<()> {
    if h.sh_offset == 0 || h.sh_count == 0 {
        return Ok(());
    }
    let names = names_table_offset(ctx, h);
    if names.is_none() {
        ctx.tab(SECTION_TAB)
            .warning("Section name string table not found, names are unavailable");
    }
    trace!("Walking {} section headers at {}", h.sh_count, h.sh_offset);

    ctx.detour_region(Offset::from_u64(h.sh_offset), |ctx| {
        let padding = h.section_stride() - h.class.section_entry_size();
        for index in 0..h.sh_count {
            section_header(ctx, h, index, names)?;
            ctx.take(padding, "Entry padding", ColorId::Unused)?;
        }
        Ok(())
    })
}

fn section_header(
    ctx: &mut Context<'_>,
    h: &Header,
    index: u16,
    names: Option<usize>,
) -> Result<()> {
    let e = h.endian;
    let class = h.class;

    let name_index = e.u32(ctx.cursor.read_array::<4>()?);
    let name = names
        .and_then(|base| base.checked_add(name_index as usize))
        .and_then(|at| c_string_at(ctx.data(), at));
    let display = match name.as_deref() {
        Some("") if index == 0 => "Null section".to_string(),
        Some("") | None => format!("Section {index}"),
        Some(name) => name.to_string(),
    };

    ctx.take_nav(4, "Section name", ColorId::Accent1, display.clone())?;
    let section_type = ctx.take_u32(e, "Section type", ColorId::Accent2)?;
    let flags = take_word(ctx, class, e, "Section flags", ColorId::Accent3)?;
    let addr = take_word(ctx, class, e, "Section address", ColorId::Accent4)?;
    let offset = take_word(ctx, class, e, "Section offset", ColorId::Accent5)?;
    let size = take_word(ctx, class, e, "Section size", ColorId::Accent6)?;
    let link = ctx.take_u32(e, "Section link", ColorId::Accent7)?;
    let info = ctx.take_u32(e, "Section information", ColorId::Accent8)?;
    let align = take_word(ctx, class, e, "Section alignment", ColorId::Accent1)?;
    let entry_size = take_word(ctx, class, e, "Section entry size", ColorId::Accent2)?;

    let type_name = match section_type {
        0x6000_0000..=0x6FFF_FFFF => "OS-specific".to_string(),
        0x7000_0000..=0x7FFF_FFFF => "Processor-specific".to_string(),
        0x8000_0000..=0xFFFF_FFFF => "Application-specific".to_string(),
        other => lookup(other, SECTION_TYPES)
            .map_or_else(|| format!("Unknown ({other})"), str::to_string),
    };

    let tab = ctx.tab(SECTION_TAB);
    tab.section(display.clone())
        .entry("Section name offset", name_index.to_string())
        .entry("Section type", type_name)
        .entry("Section flags", describe_flags(flags, SECTION_FLAGS))
        .entry("Section address", format!("0x{addr:x}"))
        .entry("Section offset", offset.to_string())
        .entry("Section size", size.to_string())
        .entry("Section link", link.to_string())
        .entry("Section information", info.to_string())
        .entry("Section alignment", align.to_string())
        .entry("Section entry size", entry_size.to_string());

    if offset != 0 && size != 0 && section_type != SHT_NOBITS {
        tag_section_data(ctx, index, &display, offset, size);
    }
    Ok(())
}

fn tag_section_data(ctx: &mut Context<'_>, index: u16, display: &str, offset: u64, size: u64) {
    let len = ctx.len();
    let start = Offset::from_u64(offset).get();
    if start >= len {
        ctx.tab(SECTION_TAB).warning(format!(
            "Data of section {display} starts at {offset}, past the end of the file"
        ));
        return;
    }
    let available = (len - start) as u64;
    if size > available {
        ctx.tab(SECTION_TAB).warning(format!(
            "Data of section {display} is truncated: {size} bytes declared, {available} present"
        ));
    }
    let length = size.min(available) as usize;

    ctx.emit(
        Field::new(
            start,
            length,
            format!("{display} section data"),
            ColorId::accent(usize::from(index) + 2),
        )
        .with_navigation(display.to_string()),
    );
    ctx.mark_region(start, start + length);
}
