use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use ipu_as::disasm::{disassemble_binary, disassemble_mem};
use ipu_as::token::Repr;
use ipu_as::{DecodedBundle, LabelEntry, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ImageKind {
    Bin,
    Mem,
}

impl ImageKind {
    pub fn guess(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mem") | Some("hex") | Some("txt") => ImageKind::Mem,
            _ => ImageKind::Bin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub kind: ImageKind,
    /// Bundle address of the first word.
    pub base: usize,
    pub bytes: Vec<u8>,
}

pub fn load_raw_bin(path: &Path, base: usize, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path)?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(Image { kind: ImageKind::Bin, base, bytes: payload.to_vec() })
}

pub fn load_mem(path: &Path, base: usize) -> Result<Image> {
    Ok(Image { kind: ImageKind::Mem, base, bytes: std::fs::read(path)? })
}

/// Decode and relocate to `img.base`: bundle addresses and the text of
/// label operands move together, raw field bits stay as encoded.
pub fn decode_image(registry: &Registry, img: &Image) -> Result<Vec<DecodedBundle>> {
    let mut bundles = match img.kind {
        ImageKind::Bin => disassemble_binary(registry, &img.bytes)?,
        ImageKind::Mem => disassemble_mem(registry, std::str::from_utf8(&img.bytes)?)?,
    };
    for b in &mut bundles {
        b.address += img.base;
        for inst in &mut b.slots {
            let Some(entry) = registry.lookup(inst.mnemonic) else { continue };
            let spec = registry.inst_type(entry.type_index);
            for (k, &j) in entry.mapping.iter().enumerate() {
                if matches!(spec.operands[j].repr, Repr::Label) {
                    let text = (inst.fields[1 + j].raw as usize + img.base).to_string();
                    inst.fields[1 + j].text = text.clone();
                    inst.operands[k] = text;
                }
            }
        }
    }
    Ok(bundles)
}

/// Targets of label-taking branches as `L<addr>` labels, excluding plain
/// fall-through to the next bundle (the cond no-op).
pub fn branch_targets(registry: &Registry, bundles: &[DecodedBundle], base: usize) -> Vec<LabelEntry> {
    let mut targets = BTreeSet::new();
    for b in bundles {
        for inst in &b.slots {
            let Some(entry) = registry.lookup(inst.mnemonic) else { continue };
            let spec = registry.inst_type(entry.type_index);
            for &j in &entry.mapping {
                if !matches!(spec.operands[j].repr, Repr::Label) {
                    continue;
                }
                let target = inst.fields[1 + j].raw as usize + base;
                if target != b.address + 1 {
                    targets.insert(target);
                }
            }
        }
    }
    targets.into_iter().map(|address| LabelEntry { name: format!("L{address:04}"), address }).collect()
}
