//! dissekt - Print the annotated byte layout of binary files
//!
//! This tool detects ELF, PNG, TIFF/Exif and TAR files and lists every
//! named byte range, the decoded description tabs, or a short summary.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use dissekt_core::{Analysis, Dissector, DissectorConfig, EmbeddedAnalysis, Line, Palette, Rgb};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::{DirEntry, WalkDir};

/// Print the annotated byte layout of ELF, PNG, TIFF/Exif and TAR files
#[derive(Parser, Debug)]
#[command(name = "dissekt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// What to print for each file
    #[arg(long, value_enum, default_value = "fields")]
    format: OutputFormat,

    /// Also analyze embedded files (such as JPEG thumbnails)
    #[arg(long)]
    embedded: bool,

    /// Paint fields with their palette colors (24-bit ANSI)
    #[arg(long)]
    color: bool,

    /// Upper bound on decompressed bytes per zlib stream
    #[arg(long, value_name = "BYTES")]
    max_inflate: Option<usize>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single file to analyze
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of files to analyze
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per field: offset, length, name
    Fields,
    /// The description tabs
    Tabs,
    /// Format, fingerprint and counts
    Summary,
}

/// Everything the renderers need besides the analysis
struct Printer {
    format: OutputFormat,
    palette: Option<Palette>,
    embedded: bool,
}

impl Printer {
    fn new(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            palette: cli.color.then(Palette::new),
            embedded: cli.embedded,
        }
    }

    fn print(
        &self,
        out: &mut impl Write,
        dissector: &Dissector,
        data: &[u8],
        analysis: &Analysis,
    ) -> io::Result<()> {
        self.render(out, data, analysis, 0)?;
        if self.embedded {
            for nested in dissector.analyze_embedded(data, analysis) {
                self.print_nested(out, data, &nested, 1)?;
            }
        }
        Ok(())
    }

    fn print_nested(
        &self,
        out: &mut impl Write,
        parent: &[u8],
        nested: &EmbeddedAnalysis,
        depth: usize,
    ) -> io::Result<()> {
        let range = nested.offset..nested.offset + nested.analysis.len;
        let Some(data) = parent.get(range) else {
            return Ok(());
        };
        writeln!(
            out,
            "{}--- embedded {} at {} ---",
            indent(depth),
            nested.analysis.format,
            nested.offset
        )?;
        self.render(out, data, &nested.analysis, depth)?;
        for child in &nested.children {
            self.print_nested(out, data, child, depth + 1)?;
        }
        Ok(())
    }

    fn render(
        &self,
        out: &mut impl Write,
        data: &[u8],
        analysis: &Analysis,
        depth: usize,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Fields => self.render_fields(out, analysis, depth),
            OutputFormat::Tabs => render_tabs(out, analysis, depth),
            OutputFormat::Summary => render_summary(out, data, analysis, depth),
        }
    }

    fn render_fields(
        &self,
        out: &mut impl Write,
        analysis: &Analysis,
        depth: usize,
    ) -> io::Result<()> {
        let pad = indent(depth);
        for field in &analysis.fields {
            let name = match &self.palette {
                Some(palette) => paint(&field.name, palette.rgb(field.color)),
                None => field.name.to_string(),
            };
            write!(out, "{pad}{:>10} {:>8}  {name}", field.offset, field.length)?;
            if let Some(label) = &field.navigation {
                write!(out, "  [{label}]")?;
            }
            if field.is_error() && self.palette.is_none() {
                write!(out, "  !")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn render_tabs(out: &mut impl Write, analysis: &Analysis, depth: usize) -> io::Result<()> {
    let pad = indent(depth);
    for tab in &analysis.tabs {
        writeln!(out, "{pad}== {} ==", tab.title)?;
        for line in &tab.lines {
            match line {
                Line::Section(title) => writeln!(out, "{pad}[{title}]")?,
                Line::Entry { key, value, tooltip } => {
                    write!(out, "{pad}  {key}: {value}")?;
                    if let Some(tooltip) = tooltip {
                        write!(out, "  ({tooltip})")?;
                    }
                    writeln!(out)?;
                }
                Line::Text(text) => {
                    for text_line in text.lines() {
                        writeln!(out, "{pad}  | {text_line}")?;
                    }
                }
                Line::Warning(message) => writeln!(out, "{pad}  warning: {message}")?,
            }
        }
    }
    Ok(())
}

fn render_summary(
    out: &mut impl Write,
    data: &[u8],
    analysis: &Analysis,
    depth: usize,
) -> io::Result<()> {
    let pad = indent(depth);
    writeln!(out, "{pad}format: {}", analysis.format)?;
    writeln!(out, "{pad}size: {} bytes", analysis.len)?;
    writeln!(out, "{pad}blake3: {}", fingerprint(data))?;
    writeln!(
        out,
        "{pad}fields: {} ({} errors)",
        analysis.fields.len(),
        analysis.error_fields().count()
    )?;
    writeln!(out, "{pad}warnings: {}", analysis.warnings().count())?;
    for file in &analysis.embedded {
        let print = data
            .get(file.range())
            .map(fingerprint)
            .unwrap_or_else(|| "out of range".to_string());
        writeln!(
            out,
            "{pad}embedded: {}..{} {} (blake3 {print})",
            file.offset,
            file.range().end,
            file.description
        )?;
    }
    Ok(())
}

/// Hex blake3 digest of `data`
fn fingerprint(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Wraps `text` in a 24-bit foreground color escape
fn paint(text: &str, rgb: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m{text}\x1b[0m", rgb.r, rgb.g, rgb.b)
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut config = DissectorConfig::new();
    if let Some(max) = cli.max_inflate {
        config = config.max_inflate_output(max);
    }
    let dissector = Dissector::with_config(config);
    let printer = Printer::new(&cli);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if let Some(ref file) = cli.input.file {
        process_single_file(&dissector, &printer, file, &mut out)?;
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&dissector, &printer, directory, &mut out)?;
    } else {
        bail!("Either --file or --directory must be specified")
    }

    out.flush().context("Failed to write output")
}

/// Analyze a single file
fn process_single_file(
    dissector: &Dissector,
    printer: &Printer,
    file: &Path,
    out: &mut impl Write,
) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    process_file(dissector, printer, file, out)
}

/// Analyze every non-hidden file below a directory
fn process_directory(
    dissector: &Dissector,
    printer: &Printer,
    directory: &Path,
    out: &mut impl Write,
) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut processed = 0;
    let mut failed = 0;

    for path in collect_files(directory) {
        writeln!(out, "==> {} <==", path.display())
            .context("Failed to write output")?;
        debug!("Processing file: {}", path.display());
        if let Err(e) = process_file(dissector, printer, &path, out) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            failed += 1;
        }
        processed += 1;
    }

    info!("Processed {} files, {} failed", processed, failed);
    Ok(())
}

/// Regular files below `directory` in walk order, skipping hidden entries
fn collect_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Read, analyze and print one file
fn process_file(
    dissector: &Dissector,
    printer: &Printer,
    path: &Path,
    out: &mut impl Write,
) -> Result<()> {
    trace!("Reading {}", path.display());
    let data = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let analysis = dissector.analyze(&data);
    debug!(
        "{}: {} with {} fields",
        path.display(),
        analysis.format,
        analysis.fields.len()
    );
    if let Some(field) = analysis.error_fields().next() {
        trace!(
            "First error field in {}: {} at {}..{}",
            path.display(),
            field.name,
            field.offset,
            field.end()
        );
    }

    printer
        .print(out, dissector, &data, &analysis)
        .with_context(|| format!("Failed to write output for {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Little-endian TIFF with an empty first IFD
    const EMPTY_TIFF: &[u8] = b"II\x2a\x00\x08\x00\x00\x00\x00\x00\x00\x00\x00\x00";

    fn printer(format: OutputFormat) -> Printer {
        Printer {
            format,
            palette: None,
            embedded: false,
        }
    }

    fn run(printer: &Printer, path: &Path) -> String {
        let mut out = Vec::new();
        process_file(&Dissector::new(), printer, path, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_summary_reports_format_and_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.tif");
        fs::write(&path, EMPTY_TIFF).unwrap();

        let text = run(&printer(OutputFormat::Summary), &path);
        assert!(text.contains("format: TIFF"));
        assert!(text.contains("size: 14 bytes"));
        assert!(text.contains(&format!("blake3: {}", fingerprint(EMPTY_TIFF))));
        assert!(text.contains("(0 errors)"));
    }

    #[test]
    fn test_fields_of_unknown_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes");
        fs::write(&path, b"plain text").unwrap();

        let text = run(&printer(OutputFormat::Fields), &path);
        assert_eq!(text, "         0       10  Unrecognized data  !\n");
    }

    #[test]
    fn test_tabs_list_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.tif");
        fs::write(&path, EMPTY_TIFF).unwrap();

        let text = run(&printer(OutputFormat::Tabs), &path);
        assert!(text.starts_with("== Header ==\n"));
        assert!(text.contains("  Byte order: "));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        let result = process_single_file(
            &Dissector::new(),
            &printer(OutputFormat::Fields),
            &dir.path().join("absent"),
            &mut out,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_files_skips_hidden() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.bin"), b"b").unwrap();
        fs::write(dir.path().join(".hidden"), b"h").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("config"), b"c").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("a.bin"), b"a").unwrap();

        let files: Vec<PathBuf> = collect_files(dir.path())
            .into_iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(files, vec![PathBuf::from("b.bin"), Path::new("sub").join("a.bin")]);
    }

    #[test]
    fn test_directory_mode_prints_every_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one"), b"1").unwrap();
        fs::write(dir.path().join("two.tif"), EMPTY_TIFF).unwrap();

        let mut out = Vec::new();
        process_directory(
            &Dissector::new(),
            &printer(OutputFormat::Summary),
            dir.path(),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("==> ").count(), 2);
        assert!(text.contains("format: unknown"));
        assert!(text.contains("format: TIFF"));
    }

    #[test]
    fn test_paint() {
        assert_eq!(paint("x", Rgb::new(1, 2, 3)), "\x1b[38;2;1;2;3mx\x1b[0m");
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
