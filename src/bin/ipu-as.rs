use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use ipu_as::disasm::{disassemble_binary, disassemble_mem, format_listing};
use ipu_as::{parse_source, AsmConfig, Assembler, Registry, SourceLine};

#[derive(Parser, Debug)]
#[command(author, version, about = "Assembler for the IPU VLIW instruction set")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a source file (.asm text or .json parse tree)
    Assemble {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = ImageFormat::Bin)]
        format: ImageFormat,
        /// JSON file with assembler settings
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override max_bundles from the config
        #[arg(long)]
        max_bundles: Option<usize>,
        /// Prefix mem-form words with 0x
        #[arg(long)]
        hex_prefix: bool,
        /// Export labels to JSON (Vec<{ name, address }>)
        #[arg(long, value_name = "FILE")]
        labels_out: Option<PathBuf>,
        /// Print a disassembly of the result
        #[arg(long)]
        listing: bool,
    },
    /// Disassemble a binary or mem image
    Disasm {
        #[arg(value_name = "IMAGE")]
        input: PathBuf,
        /// Image format; guessed from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<ImageFormat>,
        /// Show every canonical field, not just the mnemonic's operands
        #[arg(long)]
        raw_fields: bool,
    },
    /// Describe instruction types, field widths and bundle slots
    Layout {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ImageFormat {
    Bin,
    Mem,
}

fn load_config(path: Option<&Path>) -> Result<AsmConfig> {
    match path {
        Some(p) => {
            let txt = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            Ok(serde_json::from_str(&txt).with_context(|| format!("parsing {}", p.display()))?)
        }
        None => Ok(AsmConfig::default()),
    }
}

fn load_source(path: &Path) -> Result<Vec<SourceLine>> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if path.extension().is_some_and(|e| e == "json") {
        Ok(serde_json::from_str(&txt)?)
    } else {
        Ok(parse_source(&txt)?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let registry = Registry::global();

    match cli.cmd {
        Command::Assemble { input, output, format, config, max_bundles, hex_prefix, labels_out, listing } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(n) = max_bundles {
                cfg.max_bundles = n;
            }
            cfg.mem_hex_prefix |= hex_prefix;

            let lines = load_source(&input)?;
            let asm = Assembler::new(cfg);
            let program = asm.assemble(&lines)?;
            match format {
                ImageFormat::Bin => std::fs::write(&output, program.to_binary()?)?,
                ImageFormat::Mem => std::fs::write(&output, program.to_mem(asm.config().mem_hex_prefix)?)?,
            }
            if let Some(path) = labels_out {
                std::fs::write(path, serde_json::to_string_pretty(&program.labels().entries())?)?;
            }
            if listing {
                print!("{}", format_listing(&program.decode()?, &program.labels().entries(), false));
            }
            eprintln!(
                "{} bundles ({} bits each) -> {}",
                program.bundles().len(),
                program.bundle_bits(),
                output.display()
            );
        }
        Command::Disasm { input, format, raw_fields } => {
            let format = format.unwrap_or_else(|| {
                if input.extension().is_some_and(|e| e == "mem") {
                    ImageFormat::Mem
                } else {
                    ImageFormat::Bin
                }
            });
            let bundles = match format {
                ImageFormat::Bin => disassemble_binary(registry, &std::fs::read(&input)?)?,
                ImageFormat::Mem => disassemble_mem(registry, &std::fs::read_to_string(&input)?)?,
            };
            print!("{}", format_listing(&bundles, &[], raw_fields));
        }
        Command::Layout { json } => {
            let layout = registry.layout();
            if json {
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                print!("{layout}");
            }
        }
    }

    Ok(())
}
