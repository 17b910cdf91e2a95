//! Two-phase assembly: bind labels and build bundles, then encode once every
//! label is known.

use serde::{Deserialize, Serialize};

use crate::bundle::{Bundle, BundleWord};
use crate::decoder::DecodedBundle;
use crate::error::{AsmError, Location};
use crate::labels::{LabelError, LabelTable};
use crate::registry::Registry;
use crate::source::SourceLine;
use crate::token::MAX_PROGRAM_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    /// Upper bound on program length in bundles; never above the label range.
    pub max_bundles: usize,
    /// Write mem-form words with a leading `0x`.
    pub mem_hex_prefix: bool,
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self { max_bundles: MAX_PROGRAM_SIZE, mem_hex_prefix: false }
    }
}

pub struct Assembler {
    registry: &'static Registry,
    cfg: AsmConfig,
}

impl Assembler {
    pub fn new(cfg: AsmConfig) -> Self {
        Self::with_registry(Registry::global(), cfg)
    }

    pub fn with_registry(registry: &'static Registry, mut cfg: AsmConfig) -> Self {
        if cfg.max_bundles > MAX_PROGRAM_SIZE {
            tracing::warn!(requested = cfg.max_bundles, limit = MAX_PROGRAM_SIZE, "max_bundles clamped");
            cfg.max_bundles = MAX_PROGRAM_SIZE;
        }
        Self { registry, cfg }
    }

    pub fn config(&self) -> &AsmConfig {
        &self.cfg
    }

    /// Each run starts from an empty label table.
    pub fn assemble(&self, lines: &[SourceLine]) -> Result<Program, AsmError> {
        if let Some(extra) = lines.get(self.cfg.max_bundles) {
            return Err(AsmError::ProgramTooLarge { max: self.cfg.max_bundles, loc: line_location(extra) });
        }

        let mut labels = LabelTable::new();
        let mut bundles = Vec::with_capacity(lines.len());
        for (address, line) in lines.iter().enumerate() {
            if let Some(label) = &line.label {
                check_label_name(&label.text, label.loc)?;
                labels.bind(&label.text, address).map_err(|e| match e {
                    LabelError::Duplicate { name, address } => AsmError::DuplicateLabel { name, address, loc: label.loc },
                    LabelError::Undefined { name } => AsmError::UndefinedLabel { name, loc: label.loc },
                })?;
            }
            bundles.push(Bundle::new(self.registry, address, &line.instructions)?);
        }

        let program = Program { registry: self.registry, bundles, labels };
        // Every symbolic reference must resolve now that all labels are bound.
        program.encode()?;
        tracing::debug!(bundles = program.bundles.len(), labels = program.labels.len(), "assembled");
        Ok(program)
    }
}

fn line_location(line: &SourceLine) -> Location {
    line.label
        .as_ref()
        .map(|l| l.loc)
        .or_else(|| line.instructions.first().map(|i| i.opcode.loc))
        .unwrap_or_default()
}

// A name that parses as an address could never be referenced.
fn check_label_name(name: &str, loc: Location) -> Result<(), AsmError> {
    let ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(AsmError::Syntax { message: format!("invalid label name `{name}`"), loc })
    }
}

#[derive(Debug)]
pub struct Program {
    registry: &'static Registry,
    bundles: Vec<Bundle>,
    labels: LabelTable,
}

impl Program {
    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn bundle_bits(&self) -> usize {
        self.registry.bundle_bits()
    }

    pub fn encode(&self) -> Result<Vec<BundleWord>, AsmError> {
        self.bundles.iter().map(|b| b.encode(&self.labels)).collect()
    }

    /// Bundles back to back, each `ceil(bits / 8)` bytes little-endian.
    pub fn to_binary(&self) -> Result<Vec<u8>, AsmError> {
        let mut out = Vec::with_capacity(self.bundles.len() * self.registry.bundle_bytes());
        for word in self.encode()? {
            out.extend_from_slice(&word.to_le_bytes());
        }
        tracing::debug!(bytes = out.len(), "binary image");
        Ok(out)
    }

    /// One fixed-width hex word per line.
    pub fn to_mem(&self, prefix: bool) -> Result<String, AsmError> {
        let mut out = String::new();
        for word in self.encode()? {
            out.push_str(&word.to_hex(prefix));
            out.push('\n');
        }
        tracing::debug!(lines = self.bundles.len(), "mem image");
        Ok(out)
    }

    /// Decoded view of the encoded program.
    pub fn decode(&self) -> Result<Vec<DecodedBundle>, AsmError> {
        self.encode()?
            .iter()
            .enumerate()
            .map(|(address, word)| Bundle::decode(self.registry, address, word))
            .collect()
    }
}
