//! Typed, fixed-width atomic values: numeric immediates, enumerated symbols
//! and branch-target labels.

use crate::error::{AsmError, Location};
use crate::labels::LabelTable;

/// Number of bundles addressable by a label token.
pub const MAX_PROGRAM_SIZE: usize = 1024;

/// Number of bits needed to represent `v`.
pub const fn bit_length(v: u64) -> u32 {
    u64::BITS - v.leading_zeros()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    /// `bits` wide; signed types accept negative literals and store them in
    /// two's complement.
    Number { bits: u32, signed: bool },
    /// Index into an ordered vocabulary, matched case-insensitively.
    Enum(&'static [&'static str]),
    /// Bundle address, by name or as a `+k`/`-k` offset.
    Label,
}

/// Static description of a token kind. Two operand slots hold the same kind
/// of token exactly when their `TokenType`s compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenType {
    pub name: &'static str,
    pub repr: Repr,
}

impl TokenType {
    pub const fn number(name: &'static str, bits: u32) -> Self {
        Self { name, repr: Repr::Number { bits, signed: false } }
    }

    pub const fn signed(name: &'static str, bits: u32) -> Self {
        Self { name, repr: Repr::Number { bits, signed: true } }
    }

    pub const fn enumeration(name: &'static str, symbols: &'static [&'static str]) -> Self {
        Self { name, repr: Repr::Enum(symbols) }
    }

    pub const fn label(name: &'static str) -> Self {
        Self { name, repr: Repr::Label }
    }

    pub fn bits(&self) -> u32 {
        match self.repr {
            Repr::Number { bits, .. } => bits,
            Repr::Enum(symbols) => bit_length(symbols.len().saturating_sub(1) as u64),
            Repr::Label => bit_length((MAX_PROGRAM_SIZE - 1) as u64),
        }
    }

    pub fn symbols(&self) -> Option<&'static [&'static str]> {
        match self.repr {
            Repr::Enum(symbols) => Some(symbols),
            _ => None,
        }
    }

    /// The value an unused canonical slot of this type encodes to: zero,
    /// symbol index 0, or bundle address 0.
    pub fn default_token(&self, site: Site) -> Token {
        let value = match self.repr {
            Repr::Number { .. } => TokenValue::Number(0),
            Repr::Enum(_) => TokenValue::Symbol(0),
            Repr::Label => TokenValue::Address(0),
        };
        Token { ty: *self, value, site }
    }

    /// Render a raw field as source text. Labels come back as the numeric
    /// bundle address since names are not recoverable from bits.
    pub fn decode(&self, raw: u64) -> Result<String, AsmError> {
        let bits = self.bits();
        if bits < u64::BITS && raw >> bits != 0 {
            return Err(AsmError::InvalidEncoding { field: self.name, raw });
        }
        match self.repr {
            Repr::Number { signed: true, .. } if bits > 0 && raw >> (bits - 1) & 1 == 1 => {
                Ok((raw as i128 - (1i128 << bits)).to_string())
            }
            Repr::Number { .. } | Repr::Label => Ok(raw.to_string()),
            Repr::Enum(symbols) => symbols
                .get(raw as usize)
                .map(|s| s.to_string())
                .ok_or(AsmError::InvalidEncoding { field: self.name, raw }),
        }
    }
}

/// Where a token came from: the bundle it belongs to and its source position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Site {
    pub address: usize,
    pub loc: Location,
}

impl Site {
    pub fn new(address: usize, loc: Location) -> Self {
        Self { address, loc }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenValue {
    Number(u64),
    Symbol(usize),
    /// Already-resolved bundle address (relative or numeric label).
    Address(usize),
    /// Symbolic label, resolved against the label table at encode time.
    LabelRef(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    ty: TokenType,
    value: TokenValue,
    site: Site,
}

impl Token {
    pub fn parse(ty: TokenType, text: &str, site: Site) -> Result<Self, AsmError> {
        let loc = site.loc;
        let value = match ty.repr {
            Repr::Number { bits, signed } => {
                let v = parse_int(text).ok_or_else(|| AsmError::InvalidNumber {
                    text: text.to_string(),
                    loc,
                })?;
                let stored = if v < 0 && signed && bits > 0 && v >= -(1i128 << (bits - 1)) {
                    v + (1i128 << bits)
                } else {
                    v
                };
                if stored < 0 || stored >= 1i128 << bits {
                    return Err(AsmError::NumberOutOfRange { text: text.to_string(), bits, loc });
                }
                TokenValue::Number(stored as u64)
            }
            Repr::Enum(symbols) => {
                let idx = symbols
                    .iter()
                    .position(|s| s.eq_ignore_ascii_case(text))
                    .ok_or_else(|| AsmError::UnknownSymbol {
                        text: text.to_string(),
                        token: ty.name,
                        loc,
                    })?;
                TokenValue::Symbol(idx)
            }
            Repr::Label => parse_label(text, site)?,
        };
        Ok(Self { ty, value, site })
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn bits(&self) -> u32 {
        self.ty.bits()
    }

    pub fn is_label(&self) -> bool {
        matches!(self.ty.repr, Repr::Label)
    }

    /// Field value, `bits()` wide. Symbolic labels must be bound by now.
    pub fn encode(&self, labels: &LabelTable) -> Result<u64, AsmError> {
        match &self.value {
            TokenValue::Number(v) => Ok(*v),
            TokenValue::Symbol(idx) => Ok(*idx as u64),
            TokenValue::Address(addr) => Ok(*addr as u64),
            TokenValue::LabelRef(name) => labels
                .resolve(name)
                .map(|addr| addr as u64)
                .map_err(|_| AsmError::UndefinedLabel { name: name.clone(), loc: self.site.loc }),
        }
    }
}

fn parse_label(text: &str, site: Site) -> Result<TokenValue, AsmError> {
    let loc = site.loc;
    let target = if text.starts_with('+') || text.starts_with('-') {
        let k = parse_int(text).ok_or_else(|| AsmError::InvalidNumber { text: text.to_string(), loc })?;
        site.address as i128 + k
    } else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        parse_int(text).ok_or_else(|| AsmError::InvalidNumber { text: text.to_string(), loc })?
    } else {
        return Ok(TokenValue::LabelRef(text.to_string()));
    };
    if target < 0 || target >= MAX_PROGRAM_SIZE as i128 {
        return Err(AsmError::LabelOutOfRange {
            text: text.to_string(),
            target: target.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            limit: MAX_PROGRAM_SIZE,
            loc,
        });
    }
    Ok(TokenValue::Address(target as usize))
}

/// Decimal or `0x` hex, with an optional sign.
pub fn parse_int(text: &str) -> Option<i128> {
    let t = text.trim();
    let (neg, body) = match t.as_bytes().first()? {
        b'-' => (true, &t[1..]),
        b'+' => (false, &t[1..]),
        _ => (false, t),
    };
    let mag = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        if !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        body.parse::<u64>().ok()?
    };
    Some(if neg { -(mag as i128) } else { mag as i128 })
}
