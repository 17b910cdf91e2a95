use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::ConfigError;
use crate::instructions::{Format, InstSpec};
use crate::isa::ipu;
use crate::token::{Repr, Site, Token, TokenType};

/// A mnemonic resolved to its instruction type, together with the
/// precomputed `specific index -> canonical index` operand placement.
#[derive(Debug)]
pub struct MnemonicEntry {
    pub spec: &'static InstSpec,
    pub type_index: usize,
    pub format: &'static Format,
    pub mapping: Vec<usize>,
}

/// Validated instruction catalog plus bundle slot order.
#[derive(Debug)]
pub struct Registry {
    types: &'static [InstSpec],
    slots: Vec<usize>,
    entries: Vec<MnemonicEntry>,
    by_mnemonic: HashMap<String, usize>,
    nops: Vec<usize>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// The built-in IPU catalog. An invalid catalog is a bug in this crate
    /// and panics on first use, before any source is processed.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| match Registry::build(ipu::TYPES, ipu::BUNDLE_SLOTS) {
            Ok(reg) => reg,
            Err(e) => panic!("built-in instruction catalog is invalid: {e}"),
        })
    }

    pub fn build(types: &'static [InstSpec], slot_names: &[&'static str]) -> Result<Self, ConfigError> {
        let mut entries: Vec<MnemonicEntry> = Vec::new();
        let mut by_mnemonic: HashMap<String, usize> = HashMap::new();
        let mut nops = Vec::with_capacity(types.len());

        for (type_index, spec) in types.iter().enumerate() {
            for ty in spec.all_tokens() {
                check_vocabulary(ty)?;
            }
            let bits = spec.bits();
            if bits > u64::BITS {
                return Err(ConfigError::TooWide { inst_type: spec.name, bits });
            }
            let vocab = spec.opcode.symbols().unwrap_or(&[]);
            for &opcode in vocab {
                if spec.format(opcode).is_none() {
                    return Err(ConfigError::OpcodeWithoutFormat { inst_type: spec.name, opcode });
                }
            }

            for format in spec.formats {
                if !vocab.iter().any(|s| s.eq_ignore_ascii_case(format.mnemonic)) {
                    return Err(ConfigError::MnemonicNotInVocabulary {
                        inst_type: spec.name,
                        mnemonic: format.mnemonic,
                    });
                }
                let mapping = place_operands(spec.operands, format.operands).map_err(|position| {
                    ConfigError::UnplaceableOperand {
                        inst_type: spec.name,
                        mnemonic: format.mnemonic,
                        position,
                        token: format.operands[position].name,
                    }
                })?;
                let key = format.mnemonic.to_ascii_lowercase();
                if let Some(&prev) = by_mnemonic.get(&key) {
                    return Err(ConfigError::DuplicateMnemonic {
                        mnemonic: format.mnemonic,
                        first: entries[prev].spec.name,
                        second: spec.name,
                    });
                }
                by_mnemonic.insert(key, entries.len());
                entries.push(MnemonicEntry { spec, type_index, format, mapping });
            }

            let nop = spec.nop;
            let bad_nop = |reason: String| ConfigError::BadNop { inst_type: spec.name, reason };
            let nop_index = *by_mnemonic
                .get(&nop.mnemonic.to_ascii_lowercase())
                .filter(|&&i| entries[i].type_index == type_index)
                .ok_or_else(|| bad_nop(format!("`{}` is not a mnemonic of this type", nop.mnemonic)))?;
            let nop_format = entries[nop_index].format;
            if nop_format.operands.len() != nop.operands.len() {
                return Err(bad_nop(format!(
                    "`{}` takes {} operands, {} given",
                    nop.mnemonic,
                    nop_format.operands.len(),
                    nop.operands.len()
                )));
            }
            for (ty, text) in nop_format.operands.iter().zip(nop.operands) {
                Token::parse(*ty, text, Site::default()).map_err(|e| bad_nop(e.to_string()))?;
            }
            nops.push(nop_index);
        }

        let slots = slot_names
            .iter()
            .map(|&name| {
                types
                    .iter()
                    .position(|t| t.name == name)
                    .ok_or(ConfigError::UnknownSlotType { name })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(types = types.len(), mnemonics = entries.len(), slots = slots.len(), "registry built");
        Ok(Self { types, slots, entries, by_mnemonic, nops })
    }

    /// Case-insensitive mnemonic lookup across all instruction types.
    pub fn lookup(&self, mnemonic: &str) -> Option<&MnemonicEntry> {
        self.by_mnemonic
            .get(&mnemonic.to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    pub fn types(&self) -> &'static [InstSpec] {
        self.types
    }

    pub fn inst_type(&self, type_index: usize) -> &'static InstSpec {
        &self.types[type_index]
    }

    /// Instruction type index of each bundle slot, most significant first.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn slot_count(&self, type_index: usize) -> usize {
        self.slots.iter().filter(|&&t| t == type_index).count()
    }

    pub(crate) fn nop_entry(&self, type_index: usize) -> &MnemonicEntry {
        &self.entries[self.nops[type_index]]
    }

    pub fn bundle_bits(&self) -> usize {
        self.slots.iter().map(|&t| self.types[t].bits() as usize).sum()
    }

    pub fn bundle_bytes(&self) -> usize {
        self.bundle_bits().div_ceil(8)
    }

    pub fn layout(&self) -> IsaLayout {
        IsaLayout {
            bundle_bits: self.bundle_bits(),
            slots: self.slots.iter().map(|&t| self.types[t].name).collect(),
            types: self
                .types
                .iter()
                .map(|spec| TypeLayout {
                    name: spec.name,
                    bits: spec.bits(),
                    fields: spec
                        .all_tokens()
                        .map(|t| FieldLayout { token: t.name, bits: t.bits() })
                        .collect(),
                    mnemonics: spec
                        .formats
                        .iter()
                        .map(|f| MnemonicLayout {
                            mnemonic: f.mnemonic,
                            operands: f.operands.iter().map(|t| t.name).collect(),
                            summary: f.summary,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn check_vocabulary(ty: TokenType) -> Result<(), ConfigError> {
    match ty.repr {
        Repr::Enum(symbols) if symbols.len() < 2 => {
            Err(ConfigError::VocabularyTooSmall { token: ty.name, len: symbols.len() })
        }
        Repr::Number { bits: 0, .. } => Err(ConfigError::ZeroWidth { token: ty.name }),
        _ => Ok(()),
    }
}

/// Greedy left-to-right placement: each specific operand claims the first
/// unclaimed canonical slot of the same token type. On failure returns the
/// specific position that found no slot.
pub fn place_operands(canonical: &[TokenType], specific: &[TokenType]) -> Result<Vec<usize>, usize> {
    let mut claimed = vec![false; canonical.len()];
    let mut mapping = Vec::with_capacity(specific.len());
    for (i, ty) in specific.iter().enumerate() {
        let j = (0..canonical.len())
            .find(|&j| !claimed[j] && canonical[j] == *ty)
            .ok_or(i)?;
        claimed[j] = true;
        mapping.push(j);
    }
    Ok(mapping)
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldLayout {
    pub token: &'static str,
    pub bits: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MnemonicLayout {
    pub mnemonic: &'static str,
    pub operands: Vec<&'static str>,
    pub summary: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeLayout {
    pub name: &'static str,
    pub bits: u32,
    pub fields: Vec<FieldLayout>,
    pub mnemonics: Vec<MnemonicLayout>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IsaLayout {
    pub bundle_bits: usize,
    pub slots: Vec<&'static str>,
    pub types: Vec<TypeLayout>,
}

impl fmt::Display for IsaLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bundle - {} bits: {}", self.bundle_bits, self.slots.join(", "))?;
        for t in &self.types {
            writeln!(f, "{} - {} bits:", t.name, t.bits)?;
            for field in &t.fields {
                writeln!(f, "\t{} - {} bits", field.token, field.bits)?;
            }
            for m in &t.mnemonics {
                write!(f, "\t{}", m.mnemonic)?;
                for op in &m.operands {
                    write!(f, " {op}")?;
                }
                writeln!(f, ": {}", m.summary)?;
            }
        }
        Ok(())
    }
}
