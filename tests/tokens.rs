use ipu_as::isa::ipu::{BREAK_IMMEDIATE, LABEL, LCR_REG, LR_IMMEDIATE, MULT_STAGE_REG, RX_REG};
use ipu_as::token::{bit_length, Site, Token, TokenType, MAX_PROGRAM_SIZE};
use ipu_as::{AsmError, LabelTable, Location, Registry};

#[test]
fn enum_width_is_bit_length_of_last_index() {
    for n in 2..=70usize {
        let symbols: Vec<&'static str> = (0..n).map(|i| &*Box::leak(format!("s{i}").into_boxed_str())).collect();
        let ty = TokenType::enumeration("sym", Box::leak(symbols.into_boxed_slice()));
        assert_eq!(ty.bits(), bit_length(n as u64 - 1), "n = {n}");
        assert!(1u64 << ty.bits() >= n as u64);
        assert!(1u64 << (ty.bits() - 1) < n as u64);
    }
}

#[test]
fn catalog_widths() {
    assert_eq!(RX_REG.bits(), 4);
    assert_eq!(MULT_STAGE_REG.bits(), 2);
    assert_eq!(LCR_REG.bits(), 5);
    assert_eq!(LR_IMMEDIATE.bits(), 16);
    assert_eq!(LABEL.bits(), 10);
    assert_eq!(MAX_PROGRAM_SIZE, 1024);
}

#[test]
fn decode_then_parse_gives_same_field() {
    let labels = LabelTable::new();
    for ty in [RX_REG, LCR_REG, LR_IMMEDIATE, BREAK_IMMEDIATE, LABEL] {
        for raw in [0u64, 1, 7, 12, (1 << ty.bits()) - 1] {
            if raw >> ty.bits() != 0 {
                continue;
            }
            let Ok(text) = ty.decode(raw) else {
                // only enum indices past the vocabulary fail
                assert!(ty.symbols().is_some_and(|s| raw as usize >= s.len()));
                continue;
            };
            let tok = Token::parse(ty, &text, Site::default()).unwrap();
            assert_eq!(tok.encode(&labels).unwrap(), raw, "{} {text}", ty.name);
        }
    }
}

#[test]
fn every_catalog_symbol_survives_encode_decode_encode() {
    let labels = LabelTable::new();
    let mut checked = 0;
    for spec in Registry::global().types() {
        for ty in spec.all_tokens() {
            let Some(symbols) = ty.symbols() else { continue };
            for (i, sym) in symbols.iter().enumerate() {
                let first = Token::parse(ty, sym, Site::default()).unwrap().encode(&labels).unwrap();
                assert_eq!(first, i as u64);
                let text = ty.decode(first).unwrap();
                let again = Token::parse(ty, &text, Site::default()).unwrap().encode(&labels).unwrap();
                assert_eq!(again, first, "{} {sym}", ty.name);
                checked += 1;
            }
        }
    }
    // opcode vocabularies included: 7 + 3 + 3 + 5 + 4 + 8 + 3 mnemonics
    assert!(checked > 33, "{checked}");
}

#[test]
fn signed_immediate_accepts_both_ranges() {
    let labels = LabelTable::new();
    let enc = |t: &str| Token::parse(LR_IMMEDIATE, t, Site::default()).and_then(|t| t.encode(&labels));
    assert_eq!(enc("-32768"), Ok(0x8000));
    assert_eq!(enc("65535"), Ok(0xffff));
    assert_eq!(enc("-0x1"), Ok(0xffff));
    assert!(matches!(enc("-32769"), Err(AsmError::NumberOutOfRange { bits: 16, .. })));
    assert!(matches!(enc("65536"), Err(AsmError::NumberOutOfRange { .. })));
}

#[test]
fn register_names_ignore_case() {
    let tok = Token::parse(LCR_REG, "CR3", Site::default()).unwrap();
    assert_eq!(tok.encode(&LabelTable::new()), Ok(19));
    let err = Token::parse(RX_REG, "r12", Site::new(0, Location::new(4, 9))).unwrap_err();
    assert_eq!(
        err,
        AsmError::UnknownSymbol { text: "r12".into(), token: "rx_reg_field", loc: Location::new(4, 9) }
    );
}

#[test]
fn label_operands() {
    let labels = LabelTable::new();
    let at = |addr| Site::new(addr, Location::default());
    assert_eq!(Token::parse(LABEL, "+0", at(12)).unwrap().encode(&labels), Ok(12));
    assert_eq!(Token::parse(LABEL, "1023", at(0)).unwrap().encode(&labels), Ok(1023));
    assert!(matches!(
        Token::parse(LABEL, "-1", at(0)),
        Err(AsmError::LabelOutOfRange { target: -1, limit: 1024, .. })
    ));
    assert!(matches!(Token::parse(LABEL, "1024", at(0)), Err(AsmError::LabelOutOfRange { .. })));
    assert!(Token::parse(LABEL, "loop", at(0)).unwrap().is_label());
}
