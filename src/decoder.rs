use std::fmt;

use serde::Serialize;

use crate::error::AsmError;
use crate::registry::Registry;

/// One canonical field of a decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedField {
    pub token: &'static str,
    pub raw: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedInst {
    pub inst_type: &'static str,
    pub mnemonic: &'static str,
    /// Opcode followed by every canonical operand, defaulted ones included.
    pub fields: Vec<DecodedField>,
    /// Only the operands the mnemonic takes, in source order.
    pub operands: Vec<String>,
}

impl DecodedInst {
    /// All canonical fields as text, opcode first.
    pub fn canonical_text(&self) -> String {
        self.fields.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for DecodedInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic)?;
        for op in &self.operands {
            write!(f, " {op}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedBundle {
    pub address: usize,
    pub slots: Vec<DecodedInst>,
}

/// Renders as re-assemblable source: `a; b; ...;;`.
impl fmt::Display for DecodedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, inst) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{inst};")?;
        }
        f.write_str(";")
    }
}

fn mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

pub fn decode_inst(registry: &Registry, type_index: usize, raw: u64) -> Result<DecodedInst, AsmError> {
    let spec = registry.inst_type(type_index);
    let total = spec.bits();
    if raw & !mask(total) != 0 {
        return Err(AsmError::InvalidEncoding { field: spec.name, raw });
    }

    let mut shift = total;
    let mut fields = Vec::with_capacity(1 + spec.operands.len());
    for ty in spec.all_tokens() {
        let width = ty.bits();
        shift -= width;
        let value = if width == 0 { 0 } else { (raw >> shift) & mask(width) };
        fields.push(DecodedField { token: ty.name, raw: value, text: ty.decode(value)? });
    }

    let entry = registry
        .lookup(&fields[0].text)
        .filter(|e| e.type_index == type_index)
        .ok_or(AsmError::InvalidEncoding { field: spec.opcode.name, raw: fields[0].raw })?;
    // Unused canonical positions only ever hold their default (all zero).
    for (j, field) in fields.iter().enumerate().skip(1) {
        if field.raw != 0 && !entry.mapping.contains(&(j - 1)) {
            return Err(AsmError::InvalidEncoding { field: field.token, raw: field.raw });
        }
    }
    let operands = entry.mapping.iter().map(|&j| fields[1 + j].text.clone()).collect();

    Ok(DecodedInst { inst_type: spec.name, mnemonic: entry.format.mnemonic, fields, operands })
}
