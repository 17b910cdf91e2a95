use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::fmt::Write as _;
use std::path::PathBuf;

use ipu_as::disasm::format_listing;
use ipu_as::{DecodedBundle, LabelEntry, Registry};

use ipu_disasm::model::{branch_targets, decode_image, load_mem, load_raw_bin, Image, ImageKind};

#[derive(Parser, Debug)]
#[command(author, version, about = "IPU bundle image disassembler", long_about = None)]
struct Cli {
    /// Bundle address of the first word in the image
    #[arg(long, default_value_t = 0usize)]
    base: usize,
    /// Skip N bytes at start of a binary image
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Limit bytes loaded from a binary image (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Image format; guessed from the extension when omitted
    #[arg(long, value_enum)]
    image: Option<Kind>,
    /// Input image path
    #[arg(value_name = "IMAGE")]
    input: PathBuf,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the image: kind, size, bundle width and count
    Info,
    /// Disassemble bundles [start, end)
    List {
        #[arg(long)]
        start: Option<usize>,
        #[arg(long)]
        end: Option<usize>,
        /// Show each bundle's hex word
        #[arg(long)]
        show_hex: bool,
        /// Show every canonical field, not just the mnemonic's operands
        #[arg(long)]
        raw_fields: bool,
        /// Name branch targets L0000.. in the listing
        #[arg(long)]
        synth_labels: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Export synthesized labels to JSON (Vec<{ name, address }>)
        #[arg(long, value_name = "FILE")]
        labels_out: Option<PathBuf>,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind { Bin, Mem }

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

#[derive(Debug, serde::Serialize)]
struct Report<'a> {
    bundle_bits: usize,
    bundles: &'a [DecodedBundle],
    labels: Vec<LabelEntry>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let kind = match cli.image {
        Some(Kind::Bin) => ImageKind::Bin,
        Some(Kind::Mem) => ImageKind::Mem,
        None => ImageKind::guess(&cli.input),
    };
    let img: Image = match kind {
        ImageKind::Bin => load_raw_bin(&cli.input, cli.base, cli.skip, cli.len)?,
        ImageKind::Mem => {
            anyhow::ensure!(cli.skip == 0 && cli.len.is_none(), "--skip/--len apply to binary images only");
            load_mem(&cli.input, cli.base)?
        }
    };
    let registry = Registry::global();
    let bundles = decode_image(registry, &img)?;

    match cli.cmd {
        Command::Info => {
            println!("{:<8} {:<8} {:<12} {:<8}", "kind", "bytes", "bundle_bits", "bundles");
            println!(
                "{:<8} {:<8} {:<12} {:<8}",
                format!("{:?}", img.kind).to_lowercase(),
                img.bytes.len(),
                registry.bundle_bits(),
                bundles.len()
            );
        }
        Command::List { start, end, show_hex, raw_fields, synth_labels, format, labels_out, out } => {
            let start = start.unwrap_or(cli.base);
            let end = end.unwrap_or(cli.base + bundles.len());
            anyhow::ensure!(end >= start, "end must be >= start");
            let selected: Vec<DecodedBundle> = bundles
                .into_iter()
                .filter(|b| (start..end).contains(&b.address))
                .collect();

            let labels = if synth_labels || labels_out.is_some() {
                branch_targets(registry, &selected, cli.base)
            } else {
                Vec::new()
            };
            if let Some(path) = labels_out {
                std::fs::write(path, serde_json::to_string_pretty(&labels)?)?;
            }
            let shown: &[LabelEntry] = if synth_labels { &labels } else { &[] };

            let buf = match format {
                OutputFormat::Json => {
                    let report = Report { bundle_bits: registry.bundle_bits(), bundles: &selected, labels: shown.to_vec() };
                    serde_json::to_string_pretty(&report)? + "\n"
                }
                OutputFormat::Text if show_hex => {
                    let mut buf = String::new();
                    for b in &selected {
                        let word = hex_word(registry, b)?;
                        for l in shown.iter().filter(|l| l.address == b.address) {
                            let _ = writeln!(buf, "{}:", l.name);
                        }
                        let _ = writeln!(buf, "{:04}: {word}  {b}", b.address);
                    }
                    buf
                }
                OutputFormat::Text => format_listing(&selected, shown, raw_fields),
            };
            if let Some(path) = out { std::fs::write(path, buf)?; } else { print!("{}", buf); }
        }
    }

    Ok(())
}

/// Re-encode a decoded bundle's fields into its hex word.
fn hex_word(registry: &Registry, b: &DecodedBundle) -> Result<String> {
    let mut word = ipu_as::BundleWord::zeroed(registry.bundle_bits());
    let mut shift = registry.bundle_bits();
    for (inst, &ty) in b.slots.iter().zip(registry.slots()) {
        let spec = registry.inst_type(ty);
        for (field, tt) in inst.fields.iter().zip(spec.all_tokens()) {
            shift -= tt.bits() as usize;
            word.set_field(shift, tt.bits(), field.raw);
        }
    }
    anyhow::ensure!(shift == 0, "bundle fields do not cover the word");
    Ok(word.to_hex(false))
}
