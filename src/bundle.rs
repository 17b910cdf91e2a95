//! VLIW bundle: one instruction per slot, concatenated into a single word
//! wider than any machine integer.

use std::fmt;

use bitvec::prelude::*;

use crate::decoder::{decode_inst, DecodedBundle};
use crate::error::AsmError;
use crate::instructions::Instruction;
use crate::labels::LabelTable;
use crate::registry::Registry;
use crate::source::SourceInst;

/// Encoded bundle. Bit `i` of the word is bit `i` of the storage, so the raw
/// bytes are the little-endian form. Padding bits above `bits()` stay zero.
#[derive(Clone, PartialEq, Eq)]
pub struct BundleWord {
    bits: BitVec<u8, Lsb0>,
}

impl BundleWord {
    pub fn zeroed(bits: usize) -> Self {
        Self { bits: BitVec::repeat(false, bits) }
    }

    pub fn bits(&self) -> usize {
        self.bits.len()
    }

    pub fn field(&self, lo: usize, width: u32) -> u64 {
        if width == 0 {
            return 0;
        }
        self.bits[lo..lo + width as usize].load_le::<u64>()
    }

    pub fn set_field(&mut self, lo: usize, width: u32, value: u64) {
        if width == 0 {
            return;
        }
        self.bits[lo..lo + width as usize].store_le::<u64>(value);
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.bits.as_raw_slice().to_vec()
    }

    /// `bytes` must be exactly `ceil(bits / 8)` long with clear padding.
    pub fn from_le_bytes(bytes: &[u8], bits: usize) -> Result<Self, AsmError> {
        let bundle_bytes = bits.div_ceil(8);
        if bytes.len() != bundle_bytes {
            return Err(AsmError::TruncatedImage { len: bytes.len(), bundle_bytes });
        }
        let mut all = BitVec::<u8, Lsb0>::from_slice(bytes);
        if all[bits..].any() {
            return Err(AsmError::InvalidEncoding {
                field: "bundle padding",
                raw: all[bits..].load_le::<u64>(),
            });
        }
        all.truncate(bits);
        Ok(Self { bits: all })
    }

    /// Fixed `ceil(bits / 4)` hex digits, most significant first.
    pub fn to_hex(&self, prefix: bool) -> String {
        let digits = self.bits().div_ceil(4);
        let mut out = String::with_capacity(digits + 2);
        if prefix {
            out.push_str("0x");
        }
        for i in (0..digits).rev() {
            let lo = i * 4;
            let hi = (lo + 4).min(self.bits());
            let nibble = self.bits[lo..hi].load_le::<u8>();
            out.push(char::from_digit(nibble as u32, 16).unwrap_or('0'));
        }
        out
    }

    /// Inverse of [`to_hex`](Self::to_hex). Shorter strings are zero-extended;
    /// `None` if the text is not hex or does not fit in `bits`.
    pub fn from_hex(text: &str, bits: usize) -> Option<Self> {
        let t = text.trim();
        let digits = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
        if digits.is_empty() || digits.len() > bits.div_ceil(4) {
            return None;
        }
        let mut word = Self::zeroed(bits);
        for (i, c) in digits.chars().rev().enumerate() {
            let nibble = c.to_digit(16)? as u64;
            let lo = i * 4;
            let hi = (lo + 4).min(bits);
            if nibble >> (hi - lo) != 0 {
                return None;
            }
            word.bits[lo..hi].store_le::<u64>(nibble);
        }
        Some(word)
    }
}

impl fmt::Debug for BundleWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BundleWord({})", self.to_hex(true))
    }
}

#[derive(Debug, Clone)]
pub struct Bundle {
    address: usize,
    slots: Vec<Instruction>,
}

impl Bundle {
    /// Place each instruction in the first free slot of its type, then pad
    /// the rest with no-ops addressed at this bundle.
    pub fn new(registry: &'static Registry, address: usize, insts: &[SourceInst]) -> Result<Self, AsmError> {
        let layout = registry.slots();
        let mut filled: Vec<Option<Instruction>> = vec![None; layout.len()];

        for src in insts {
            let entry = registry.lookup(&src.opcode.text).ok_or_else(|| AsmError::UnknownMnemonic {
                mnemonic: src.opcode.text.clone(),
                loc: src.opcode.loc,
            })?;
            let inst = Instruction::new(entry, src, address)?;
            let ty = inst.type_index();
            let max = registry.slot_count(ty);
            if max == 0 {
                return Err(AsmError::SlotNotPermitted {
                    mnemonic: inst.mnemonic().to_string(),
                    inst_type: inst.inst_type(),
                    loc: inst.location(),
                });
            }
            let free = (0..layout.len()).find(|&i| layout[i] == ty && filled[i].is_none());
            match free {
                Some(i) => {
                    tracing::trace!(address, slot = i, mnemonic = inst.mnemonic(), "place");
                    filled[i] = Some(inst);
                }
                None => {
                    let first = filled
                        .iter()
                        .flatten()
                        .find(|prev| prev.type_index() == ty)
                        .map(|prev| prev.location())
                        .unwrap_or_default();
                    return Err(AsmError::TooManyOfType {
                        inst_type: inst.inst_type(),
                        max,
                        first,
                        second: inst.location(),
                    });
                }
            }
        }

        let slots = filled
            .into_iter()
            .zip(layout)
            .map(|(inst, &ty)| match inst {
                Some(inst) => Ok(inst),
                None => Instruction::nop(registry, ty, address),
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(address, given = insts.len(), "bundle built");
        Ok(Self { address, slots })
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn slots(&self) -> &[Instruction] {
        &self.slots
    }

    pub fn bits(&self) -> usize {
        self.slots.iter().map(|i| i.bits() as usize).sum()
    }

    /// Last slot in the lowest bits.
    pub fn encode(&self, labels: &LabelTable) -> Result<BundleWord, AsmError> {
        let mut word = BundleWord::zeroed(self.bits());
        let mut shift = 0;
        for inst in self.slots.iter().rev() {
            let width = inst.bits();
            word.set_field(shift, width, inst.encode(labels)?);
            shift += width as usize;
        }
        Ok(word)
    }

    pub fn decode(registry: &Registry, address: usize, word: &BundleWord) -> Result<DecodedBundle, AsmError> {
        let bundle_bits = registry.bundle_bits();
        if word.bits() != bundle_bits {
            return Err(AsmError::TruncatedImage {
                len: word.bits().div_ceil(8),
                bundle_bytes: registry.bundle_bytes(),
            });
        }
        let mut shift = bundle_bits;
        let mut slots = Vec::with_capacity(registry.slots().len());
        for &ty in registry.slots() {
            let width = registry.inst_type(ty).bits();
            shift -= width as usize;
            slots.push(decode_inst(registry, ty, word.field(shift, width))?);
        }
        Ok(DecodedBundle { address, slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::source::SourceToken;

    fn inst(text: &str) -> SourceInst {
        let mut words = text.split_whitespace().map(|w| SourceToken::new(w, Location::new(1, 1)));
        SourceInst { opcode: words.next().unwrap(), operands: words.collect() }
    }

    #[test]
    fn bundle_is_175_bits_in_22_bytes() {
        let reg = Registry::global();
        let b = Bundle::new(reg, 0, &[]).unwrap();
        assert_eq!(b.bits(), 175);
        let word = b.encode(&LabelTable::new()).unwrap();
        assert_eq!(word.to_le_bytes().len(), 22);
        assert_eq!(word.to_hex(false).len(), 44);
    }

    #[test]
    fn two_lr_instructions_fill_both_slots() {
        let reg = Registry::global();
        let b = Bundle::new(reg, 3, &[inst("set lr1 7"), inst("incr lr2 -1")]).unwrap();
        let names: Vec<_> = b.slots().iter().map(|i| i.mnemonic()).collect();
        assert_eq!(
            names,
            vec!["xmem_nop", "mult_nop", "acc_nop", "mac_nop", "set", "incr", "b", "break_nop"]
        );
    }

    #[test]
    fn hex_round_trips_through_word() {
        let mut w = BundleWord::zeroed(175);
        w.set_field(170, 5, 0b10110);
        w.set_field(0, 12, 0xabc);
        let hex = w.to_hex(true);
        assert!(hex.starts_with("0x58"), "{hex}");
        assert!(hex.ends_with("abc"));
        assert_eq!(BundleWord::from_hex(&hex, 175), Some(w.clone()));
        assert_eq!(BundleWord::from_le_bytes(&w.to_le_bytes(), 175), Ok(w));
        // top digit holds only three bits
        assert_eq!(BundleWord::from_hex(&format!("f{}", "0".repeat(43)), 175), None);
    }

    #[test]
    fn padding_bits_must_be_clear() {
        let mut bytes = vec![0u8; 22];
        bytes[21] = 0x80;
        assert!(matches!(
            BundleWord::from_le_bytes(&bytes, 175),
            Err(AsmError::InvalidEncoding { .. })
        ));
        assert!(matches!(
            BundleWord::from_le_bytes(&bytes[..21], 175),
            Err(AsmError::TruncatedImage { len: 21, bundle_bytes: 22 })
        ));
    }
}
