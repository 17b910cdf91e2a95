use std::fmt;

use serde::{Deserialize, Serialize};

/// 1-based position of a token in the assembly source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised while assembling or decoding a program.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("invalid number `{text}` ({loc})")]
    InvalidNumber { text: String, loc: Location },
    #[error("number `{text}` does not fit in {bits} bits ({loc})")]
    NumberOutOfRange { text: String, bits: u32, loc: Location },
    #[error("`{text}` is not a valid {token} ({loc})")]
    UnknownSymbol {
        text: String,
        token: &'static str,
        loc: Location,
    },
    #[error("unknown mnemonic `{mnemonic}` ({loc})")]
    UnknownMnemonic { mnemonic: String, loc: Location },
    #[error("label `{name}` already defined at bundle {address} ({loc})")]
    DuplicateLabel {
        name: String,
        address: usize,
        loc: Location,
    },
    #[error("undefined label `{name}` ({loc})")]
    UndefinedLabel { name: String, loc: Location },
    #[error("label `{text}` resolves to {target}, outside program range 0..{limit} ({loc})")]
    LabelOutOfRange {
        text: String,
        target: i64,
        limit: usize,
        loc: Location,
    },
    #[error("instruction `{mnemonic}` expects {expected}, got {got} operands ({loc})")]
    Arity {
        mnemonic: String,
        expected: usize,
        got: usize,
        loc: Location,
    },
    #[error("instruction `{mnemonic}` of type {inst_type} is not permitted in a bundle ({loc})")]
    SlotNotPermitted {
        mnemonic: String,
        inst_type: &'static str,
        loc: Location,
    },
    #[error(
        "too many {inst_type} instructions in one bundle (max = {max})\n\
         first occurrence: {first}\nsecond occurrence: {second}"
    )]
    TooManyOfType {
        inst_type: &'static str,
        max: usize,
        first: Location,
        second: Location,
    },
    #[error("program has more than {max} bundles ({loc})")]
    ProgramTooLarge { max: usize, loc: Location },
    #[error("syntax error: {message} ({loc})")]
    Syntax { message: String, loc: Location },
    #[error("field {field} holds {raw:#x}, which has no encoding")]
    InvalidEncoding { field: &'static str, raw: u64 },
    #[error("image of {len} bytes is not a whole number of {bundle_bytes}-byte bundles")]
    TruncatedImage { len: usize, bundle_bytes: usize },
    #[error("mem line {line}: {message}")]
    BadMemWord { line: usize, message: String },
}

/// Defects in an instruction catalog. These are programmer errors and are
/// reported when a registry is built, before any source is read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mnemonic `{mnemonic}` is declared by both {first} and {second}")]
    DuplicateMnemonic {
        mnemonic: &'static str,
        first: &'static str,
        second: &'static str,
    },
    #[error("{inst_type}: operand {position} ({token}) of `{mnemonic}` has no free canonical slot")]
    UnplaceableOperand {
        inst_type: &'static str,
        mnemonic: &'static str,
        position: usize,
        token: &'static str,
    },
    #[error("{inst_type}: mnemonic `{mnemonic}` is missing from the opcode vocabulary")]
    MnemonicNotInVocabulary {
        inst_type: &'static str,
        mnemonic: &'static str,
    },
    #[error("{inst_type}: opcode `{opcode}` has no operand format")]
    OpcodeWithoutFormat {
        inst_type: &'static str,
        opcode: &'static str,
    },
    #[error("token type {token} needs at least two symbols, has {len}")]
    VocabularyTooSmall { token: &'static str, len: usize },
    #[error("numeric token type {token} has zero width")]
    ZeroWidth { token: &'static str },
    #[error("bundle slot names unknown instruction type `{name}`")]
    UnknownSlotType { name: &'static str },
    #[error("{inst_type} is {bits} bits wide, limit is 64")]
    TooWide { inst_type: &'static str, bits: u32 },
    #[error("{inst_type}: no-op is invalid: {reason}")]
    BadNop {
        inst_type: &'static str,
        reason: String,
    },
}
