//! Name tables for ELF enumerations and bit flags.

pub(super) const OS_ABIS: &[(u8, &str)] = &[
    (0, "UNIX System V"),
    (1, "HP-UX"),
    (2, "NetBSD"),
    (3, "Linux"),
    (4, "GNU Hurd"),
    (6, "Solaris"),
    (7, "AIX"),
    (8, "IRIX"),
    (9, "FreeBSD"),
    (10, "Tru64"),
    (11, "Novell Modesto"),
    (12, "OpenBSD"),
    (13, "OpenVMS"),
    (14, "NonStop Kernel"),
    (15, "AROS"),
    (16, "FenixOS"),
    (17, "CloudABI"),
    (18, "Stratus Technologies OpenVOS"),
];

pub(super) const OBJECT_TYPES: &[(u16, &str)] = &[
    (0, "No file type"),
    (1, "Relocatable file"),
    (2, "Executable file"),
    (3, "Shared object file"),
    (4, "Core file"),
];

pub(super) const MACHINES: &[(u16, &str)] = &[
    (0, "No machine"),
    (2, "SPARC"),
    (3, "Intel 80386"),
    (4, "Motorola 68000"),
    (5, "Motorola 88000"),
    (7, "Intel 80860"),
    (8, "MIPS"),
    (10, "MIPS RS3000 little-endian"),
    (15, "HP PA-RISC"),
    (20, "PowerPC"),
    (21, "PowerPC 64-bit"),
    (22, "IBM S/390"),
    (40, "ARM"),
    (42, "SuperH"),
    (43, "SPARC V9"),
    (50, "Intel IA-64"),
    (62, "AMD x86-64"),
    (183, "ARM AArch64"),
    (188, "Tilera TILEPro"),
    (190, "NVIDIA CUDA"),
    (224, "AMD GPU"),
    (243, "RISC-V"),
    (247, "Linux BPF"),
    (258, "LoongArch"),
];

pub(super) const SEGMENT_TYPES: &[(u32, &str)] = &[
    (0, "Unused entry (PT_NULL)"),
    (1, "Loadable segment (PT_LOAD)"),
    (2, "Dynamic linking information (PT_DYNAMIC)"),
    (3, "Interpreter path (PT_INTERP)"),
    (4, "Auxiliary information (PT_NOTE)"),
    (5, "Reserved (PT_SHLIB)"),
    (6, "Program header table (PT_PHDR)"),
    (7, "Thread-local storage template (PT_TLS)"),
];

pub(super) const SEGMENT_FLAGS: &[(u64, &str)] = &[(1, "Execute"), (2, "Write"), (4, "Read")];

pub(super) const SHT_NOBITS: u32 = 8;

pub(super) const SECTION_TYPES: &[(u32, &str)] = &[
    (0, "Inactive (SHT_NULL)"),
    (1, "Program data (SHT_PROGBITS)"),
    (2, "Symbol table (SHT_SYMTAB)"),
    (3, "String table (SHT_STRTAB)"),
    (4, "Relocations with addends (SHT_RELA)"),
    (5, "Symbol hash table (SHT_HASH)"),
    (6, "Dynamic linking information (SHT_DYNAMIC)"),
    (7, "Notes (SHT_NOTE)"),
    (SHT_NOBITS, "Uninitialized data (SHT_NOBITS)"),
    (9, "Relocations (SHT_REL)"),
    (10, "Reserved (SHT_SHLIB)"),
    (11, "Dynamic linker symbols (SHT_DYNSYM)"),
    (14, "Constructors (SHT_INIT_ARRAY)"),
    (15, "Destructors (SHT_FINI_ARRAY)"),
    (16, "Pre-constructors (SHT_PREINIT_ARRAY)"),
    (17, "Section group (SHT_GROUP)"),
];

pub(super) const SECTION_FLAGS: &[(u64, &str)] = &[
    (0x1, "Writable"),
    (0x2, "Occupies memory"),
    (0x4, "Executable"),
    (0x10, "Mergeable"),
    (0x20, "Contains strings"),
    (0x40, "Holds section index"),
    (0x80, "Preserve order after combining"),
    (0x100, "OS-specific handling"),
    (0x200, "Group member"),
    (0x400, "Thread-local data"),
    (0x800, "Compressed"),
];
