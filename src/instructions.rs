use crate::error::{AsmError, Location};
use crate::labels::LabelTable;
use crate::registry::{MnemonicEntry, Registry};
use crate::source::SourceInst;
use crate::token::{Site, Token, TokenType};

/// Operand shape of one mnemonic. May be shorter than, or reordered
/// relative to, the canonical layout of its instruction type.
#[derive(Debug, Clone, Copy)]
pub struct Format {
    pub mnemonic: &'static str,
    pub operands: &'static [TokenType],
    pub summary: &'static str,
}

/// The instruction used to pad a bundle slot nobody filled.
#[derive(Debug, Clone, Copy)]
pub struct NopSpec {
    pub mnemonic: &'static str,
    pub operands: &'static [&'static str],
}

/// Catalog entry for one instruction type (one kind of bundle slot).
#[derive(Debug)]
pub struct InstSpec {
    pub name: &'static str,
    pub opcode: TokenType,
    /// Maximal operand shape; fixes the bit layout for every mnemonic.
    pub operands: &'static [TokenType],
    pub formats: &'static [Format],
    pub nop: NopSpec,
}

impl InstSpec {
    /// Opcode followed by the canonical operands, most significant first.
    pub fn all_tokens(&self) -> impl DoubleEndedIterator<Item = TokenType> + '_ {
        std::iter::once(self.opcode).chain(self.operands.iter().copied())
    }

    pub fn bits(&self) -> u32 {
        self.all_tokens().map(|t| t.bits()).sum()
    }

    pub fn format(&self, mnemonic: &str) -> Option<&'static Format> {
        self.formats.iter().find(|f| f.mnemonic.eq_ignore_ascii_case(mnemonic))
    }
}

/// One position of the canonical token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalSlot {
    Filled(Token),
    Defaulted(Token),
}

impl CanonicalSlot {
    pub fn token(&self) -> &Token {
        match self {
            CanonicalSlot::Filled(t) | CanonicalSlot::Defaulted(t) => t,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, CanonicalSlot::Filled(_))
    }
}

/// A parsed occurrence of a mnemonic with its operand tokens.
#[derive(Debug, Clone)]
pub struct Instruction {
    entry: &'static MnemonicEntry,
    opcode: Token,
    operands: Vec<Token>,
}

impl Instruction {
    pub fn new(entry: &'static MnemonicEntry, inst: &SourceInst, address: usize) -> Result<Self, AsmError> {
        Self::build(
            entry,
            (inst.opcode.text.as_str(), inst.opcode.loc),
            inst.operands.iter().map(|t| (t.text.as_str(), t.loc)).collect(),
            address,
        )
    }

    /// The no-op of `type_index`, addressed at `address`.
    pub fn nop(registry: &'static Registry, type_index: usize, address: usize) -> Result<Self, AsmError> {
        let entry = registry.nop_entry(type_index);
        let nop = entry.spec.nop;
        Self::build(
            entry,
            (nop.mnemonic, Location::default()),
            nop.operands.iter().map(|t| (*t, Location::default())).collect(),
            address,
        )
    }

    fn build(
        entry: &'static MnemonicEntry,
        (mnemonic, loc): (&str, Location),
        operands: Vec<(&str, Location)>,
        address: usize,
    ) -> Result<Self, AsmError> {
        let expected = entry.format.operands.len();
        if operands.len() != expected {
            return Err(AsmError::Arity {
                mnemonic: mnemonic.to_string(),
                expected,
                got: operands.len(),
                loc,
            });
        }
        let opcode = Token::parse(entry.spec.opcode, mnemonic, Site::new(address, loc))?;
        let operands = entry
            .format
            .operands
            .iter()
            .zip(operands)
            .map(|(ty, (text, loc))| Token::parse(*ty, text, Site::new(address, loc)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entry, opcode, operands })
    }

    pub fn mnemonic(&self) -> &'static str {
        self.entry.format.mnemonic
    }

    pub fn inst_type(&self) -> &'static str {
        self.entry.spec.name
    }

    pub fn type_index(&self) -> usize {
        self.entry.type_index
    }

    pub fn location(&self) -> Location {
        self.opcode.site().loc
    }

    pub fn operands(&self) -> &[Token] {
        &self.operands
    }

    pub fn bits(&self) -> u32 {
        self.entry.spec.bits()
    }

    /// Opcode at position 0, each operand at `1 + mapping[i]`, every other
    /// position holding its type's default.
    pub fn canonical_tokens(&self) -> Vec<CanonicalSlot> {
        let site = self.opcode.site();
        let mut out: Vec<CanonicalSlot> = std::iter::once(CanonicalSlot::Filled(self.opcode.clone()))
            .chain(
                self.entry
                    .spec
                    .operands
                    .iter()
                    .map(|ty| CanonicalSlot::Defaulted(ty.default_token(site))),
            )
            .collect();
        for (tok, &pos) in self.operands.iter().zip(&self.entry.mapping) {
            out[1 + pos] = CanonicalSlot::Filled(tok.clone());
        }
        out
    }

    /// Last canonical token in the lowest bits, opcode in the highest.
    pub fn encode(&self, labels: &LabelTable) -> Result<u64, AsmError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        for slot in self.canonical_tokens().iter().rev() {
            let tok = slot.token();
            value |= tok.encode(labels)? << shift;
            shift += tok.bits();
        }
        Ok(value)
    }
}
