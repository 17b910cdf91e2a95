use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::bundle::{Bundle, BundleWord};
use crate::decoder::DecodedBundle;
use crate::error::AsmError;
use crate::labels::LabelEntry;
use crate::registry::Registry;

/// Decode a little-endian image of back-to-back bundles.
pub fn disassemble_binary(registry: &Registry, bytes: &[u8]) -> Result<Vec<DecodedBundle>, AsmError> {
    let bundle_bytes = registry.bundle_bytes();
    if bundle_bytes == 0 || bytes.len() % bundle_bytes != 0 {
        return Err(AsmError::TruncatedImage { len: bytes.len(), bundle_bytes });
    }
    bytes
        .chunks(bundle_bytes)
        .enumerate()
        .map(|(address, chunk)| {
            let word = BundleWord::from_le_bytes(chunk, registry.bundle_bits())?;
            Bundle::decode(registry, address, &word)
        })
        .collect()
}

/// Decode the mem text form: one hex word per non-blank line.
pub fn disassemble_mem(registry: &Registry, text: &str) -> Result<Vec<DecodedBundle>, AsmError> {
    let bits = registry.bundle_bits();
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let word = BundleWord::from_hex(line, bits).ok_or_else(|| AsmError::BadMemWord {
            line: i + 1,
            message: format!("`{line}` is not a {bits}-bit hex word"),
        })?;
        out.push(Bundle::decode(registry, out.len(), &word)?);
    }
    Ok(out)
}

/// One bundle per line as `AAAA: slots;;`, each labelled address preceded
/// by its `name:` line. `raw_fields` prints every canonical field.
pub fn format_listing(bundles: &[DecodedBundle], labels: &[LabelEntry], raw_fields: bool) -> String {
    let mut by_addr: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for l in labels {
        by_addr.entry(l.address).or_default().push(&l.name);
    }

    let mut buf = String::new();
    for b in bundles {
        for name in by_addr.get(&b.address).into_iter().flatten() {
            let _ = writeln!(buf, "{name}:");
        }
        if raw_fields {
            let _ = write!(buf, "{:04}:", b.address);
            for inst in &b.slots {
                let _ = write!(buf, " {};", inst.canonical_text());
            }
            let _ = writeln!(buf, ";");
        } else {
            let _ = writeln!(buf, "{:04}: {b}", b.address);
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_has_no_bundles() {
        let reg = Registry::global();
        assert_eq!(disassemble_binary(reg, &[]), Ok(vec![]));
        assert_eq!(disassemble_mem(reg, "\n\n"), Ok(vec![]));
    }

    #[test]
    fn partial_bundle_is_rejected() {
        let reg = Registry::global();
        assert_eq!(
            disassemble_binary(reg, &[0u8; 30]),
            Err(AsmError::TruncatedImage { len: 30, bundle_bytes: 22 })
        );
    }

    #[test]
    fn mem_errors_carry_line_number() {
        let reg = Registry::global();
        let err = disassemble_mem(reg, "\nxyz\n").unwrap_err();
        assert!(matches!(err, AsmError::BadMemWord { line: 2, .. }), "{err}");
    }
}
