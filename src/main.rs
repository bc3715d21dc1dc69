//! transpatch CLI - translate strings of a PE executable in place.
//!
//! Every command that modifies an executable works on a copy: SOURCE is
//! copied to PATCHED and only PATCHED is changed.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use transpatch::analysis::{extract_strings_grouped_by_subroutines, write_grouped};
use transpatch::charmap::CharmapOutcome;
use transpatch::config::{AppConfig, DEFAULT_CONFIG_FILE};
use transpatch::io::{map_readonly, with_source_copy, IOLimits};
use transpatch::logging::{init_tracing, init_tracing_json};
use transpatch::patch::{extract_referenced_strings, patch_charmap_file, run_on_file, write_strings};
use transpatch::{log_error, PeImage, TranslationDictionary};

const DEFAULT_SOURCE: &str = "Dwarf Fortress.exe";
const DEFAULT_PATCHED: &str = "Dwarf Fortress Patched.exe";

/// In-place string translation for x64 PE executables.
#[derive(Parser)]
#[command(name = "transpatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy SOURCE to PATCHED and translate its strings
    Patch {
        #[arg(default_value = DEFAULT_SOURCE)]
        source: PathBuf,

        #[arg(default_value = DEFAULT_PATCHED)]
        patched: PathBuf,

        /// Path to the dictionary csv file
        #[arg(long = "dict")]
        dictionary: Option<PathBuf>,

        /// Encoding for the translation
        #[arg(long)]
        encoding: Option<String>,

        /// Enable support of the given codepage by name
        #[arg(long)]
        codepage: Option<String>,

        /// Remove the patched file on error
        #[arg(long)]
        cleanup: bool,
    },

    /// List strings referenced from code, one per line
    Extract {
        file: PathBuf,

        /// Output file ("stdout" or omitted for standard output)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List referenced strings grouped by the subroutine using them
    ExtractBySubs {
        file: PathBuf,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Copy SOURCE to PATCHED and remap only its glyph table
    Charmap {
        #[arg(default_value = DEFAULT_SOURCE)]
        source: PathBuf,

        #[arg(default_value = DEFAULT_PATCHED)]
        patched: PathBuf,

        /// Codepage to remap the glyph table to
        #[arg(long)]
        codepage: String,

        /// Remove the patched file on error
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        init_tracing_json();
    } else {
        init_tracing();
    }

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = AppConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    match cli.command {
        Commands::Patch {
            source,
            patched,
            dictionary,
            encoding,
            codepage,
            cleanup,
        } => {
            if encoding.is_some() {
                config.patch.encoding = encoding;
            }
            if codepage.is_some() {
                config.patch.codepage = codepage;
            }
            config.cleanup |= cleanup;
            let dictionary = dictionary
                .or_else(|| config.dictionary.as_ref().map(PathBuf::from))
                .context("no dictionary given (--dict)")?;
            patch(&source, &patched, &dictionary, &config)
        }
        Commands::Extract { file, out } => {
            let image = load_image(&file, &config.patch.limits)?;
            let strings = extract_referenced_strings(&image, &config.patch.analysis)?;
            let mut writer = open_output(out.as_deref())?;
            write_strings(&mut writer, &strings)?;
            writer.flush()?;
            Ok(())
        }
        Commands::ExtractBySubs { file, out } => {
            let image = load_image(&file, &config.patch.limits)?;
            let grouped = extract_strings_grouped_by_subroutines(&image, &config.patch.analysis)?;
            let mut writer = open_output(out.as_deref())?;
            write_grouped(&mut writer, &grouped)?;
            writer.flush()?;
            Ok(())
        }
        Commands::Charmap {
            source,
            patched,
            codepage,
            cleanup,
        } => {
            config.patch.codepage = Some(codepage);
            let outcome = with_source_copy(&source, &patched, cleanup || config.cleanup, |dest| {
                patch_charmap_file(dest, &config.patch)
            })
            .map_err(|e| log_error!(e, "charmap patch failed"))?;
            if !matches!(outcome, CharmapOutcome::Patched { .. }) {
                warn!(?outcome, "Glyph table left unchanged");
            }
            Ok(())
        }
    }
}

fn patch(source: &Path, patched: &Path, dictionary: &Path, config: &AppConfig) -> anyhow::Result<()> {
    let dictionary = TranslationDictionary::load(dictionary)
        .with_context(|| format!("loading dictionary {}", dictionary.display()))?;

    let report = with_source_copy(source, patched, config.cleanup, |dest| {
        run_on_file(dest, &dictionary, &config.patch)
    })
    .map_err(|e| log_error!(e, "patch failed"))?;

    info!(
        strings = report.strings_found,
        referenced = report.referenced_strings,
        references = report.total_references,
        overlaps = report.overlaps.len(),
        patched = report.patched(),
        skipped = report.skipped(),
        "Patch complete"
    );
    Ok(())
}

fn load_image(path: &Path, limits: &IOLimits) -> anyhow::Result<PeImage> {
    let map = map_readonly(path, limits).with_context(|| format!("opening {}", path.display()))?;
    Ok(PeImage::parse(&map)?)
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        Some(p) if p == Path::new("stdout") => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        Some(p) => {
            let file = File::create(p).with_context(|| format!("creating {}", p.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}
