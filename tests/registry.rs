use ipu_as::instructions::{Format, InstSpec, NopSpec};
use ipu_as::token::TokenType;
use ipu_as::{AsmConfig, AsmError, Assembler, ConfigError, LabelTable, Registry};
use ipu_as::{parse_source, Bundle};
use pretty_assertions::assert_eq;

const REG: TokenType = TokenType::enumeration("reg", &["r0", "r1", "r2", "r3"]);
const IMM: TokenType = TokenType::number("imm", 8);
const TARGET: TokenType = TokenType::label("target");

const ALU: InstSpec = InstSpec {
    name: "alu",
    opcode: TokenType::enumeration("alu_op", &["add", "mov", "alu_nop"]),
    operands: &[REG, REG, IMM],
    formats: &[
        Format { mnemonic: "add", operands: &[REG, REG], summary: "Ra += Rb" },
        Format { mnemonic: "mov", operands: &[REG, IMM], summary: "Ra = imm" },
        Format { mnemonic: "alu_nop", operands: &[], summary: "no operation" },
    ],
    nop: NopSpec { mnemonic: "alu_nop", operands: &[] },
};

const BR: InstSpec = InstSpec {
    name: "br",
    opcode: TokenType::enumeration("br_op", &["jmp", "br_nop"]),
    operands: &[TARGET],
    formats: &[
        Format { mnemonic: "jmp", operands: &[TARGET], summary: "goto target" },
        Format { mnemonic: "br_nop", operands: &[], summary: "no operation" },
    ],
    nop: NopSpec { mnemonic: "br_nop", operands: &[] },
};

static TOY: &[InstSpec] = &[ALU, BR];

fn toy(slots: &[&'static str]) -> &'static Registry {
    Box::leak(Box::new(Registry::build(TOY, slots).unwrap()))
}

#[test]
fn builtin_catalog_is_valid() {
    let reg = Registry::global();
    assert_eq!(reg.bundle_bits(), 175);
    assert_eq!(reg.bundle_bytes(), 22);
    let layout = reg.layout();
    assert_eq!(layout.slots, vec!["xmem", "mult", "acc", "mac", "lr", "lr", "cond", "break"]);
    let widths: Vec<_> = layout.types.iter().map(|t| (t.name, t.bits)).collect();
    assert_eq!(
        widths,
        vec![("xmem", 19), ("mult", 12), ("acc", 18), ("mac", 19), ("lr", 32), ("cond", 21), ("break", 22)]
    );
    assert!(layout.to_string().starts_with("bundle - 175 bits"));
}

#[test]
fn layout_describes_each_mnemonic() {
    let layout = Registry::global().layout();
    let cond = layout.types.iter().find(|t| t.name == "cond").unwrap();
    let beq = cond.mnemonics.iter().find(|m| m.mnemonic == "beq").unwrap();
    assert_eq!(beq.operands, vec!["lr_reg_field", "lr_reg_field", "label_token"]);
    assert_eq!(beq.summary, "if (Lr1 == Lr2) goto label");

    let text = layout.to_string();
    assert!(text.contains("\tbeq lr_reg_field lr_reg_field label_token: if (Lr1 == Lr2) goto label\n"), "{text}");
    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["types"][0]["mnemonics"][0]["summary"], "Memory[Lr + Cr] = Rx");
}

#[test]
fn mapping_is_precomputed_per_mnemonic() {
    let reg = Registry::global();
    assert_eq!(reg.lookup("b").unwrap().mapping, vec![2]);
    assert_eq!(reg.lookup("br").unwrap().mapping, vec![0]);
    assert_eq!(reg.lookup("str_acc_reg").unwrap().mapping, vec![1, 2]);
    assert_eq!(reg.lookup("ldr_cyclic_mult_reg").unwrap().mapping, vec![1, 2, 3]);
    assert_eq!(reg.lookup("add").unwrap().mapping, vec![0, 1, 2]);
    assert_eq!(reg.lookup("zero_rq").unwrap().mapping, vec![0]);
}

#[test]
fn custom_catalog_encodes_through_mapping() {
    let reg = toy(&["alu", "alu", "br"]);
    assert_eq!(reg.bundle_bits(), 14 + 14 + 11);
    let lines = parse_source("mov r2 0x7f; jmp +0;;").unwrap();
    let b = Bundle::new(reg, 0, &lines[0].instructions).unwrap();
    // alu: op(2) reg(2) reg(2) imm(8); mov fills positions 0 and 2
    assert_eq!(b.slots()[0].encode(&LabelTable::new()), Ok((1 << 12) | (2 << 10) | 0x7f));
    assert_eq!(b.slots()[1].mnemonic(), "alu_nop");
}

#[test]
fn duplicate_mnemonic_across_types() {
    static TYPES: &[InstSpec] = &[
        ALU,
        InstSpec {
            name: "br",
            opcode: TokenType::enumeration("br_op", &["jmp", "alu_nop"]),
            operands: &[TARGET],
            formats: &[
                Format { mnemonic: "jmp", operands: &[TARGET], summary: "" },
                Format { mnemonic: "alu_nop", operands: &[], summary: "" },
            ],
            nop: NopSpec { mnemonic: "alu_nop", operands: &[] },
        },
    ];
    assert_eq!(
        Registry::build(TYPES, &["alu", "br"]).unwrap_err(),
        ConfigError::DuplicateMnemonic { mnemonic: "alu_nop", first: "alu", second: "br" }
    );
}

#[test]
fn unplaceable_operand() {
    static TYPES: &[InstSpec] = &[InstSpec {
        name: "alu",
        opcode: TokenType::enumeration("alu_op", &["two_imm", "alu_nop"]),
        operands: &[REG, IMM],
        formats: &[
            Format { mnemonic: "two_imm", operands: &[IMM, IMM], summary: "" },
            Format { mnemonic: "alu_nop", operands: &[], summary: "" },
        ],
        nop: NopSpec { mnemonic: "alu_nop", operands: &[] },
    }];
    assert_eq!(
        Registry::build(TYPES, &["alu"]).unwrap_err(),
        ConfigError::UnplaceableOperand { inst_type: "alu", mnemonic: "two_imm", position: 1, token: "imm" }
    );
}

#[test]
fn single_symbol_vocabulary_is_rejected() {
    static TYPES: &[InstSpec] = &[InstSpec {
        name: "only",
        opcode: TokenType::enumeration("only_op", &["only_nop"]),
        operands: &[],
        formats: &[Format { mnemonic: "only_nop", operands: &[], summary: "" }],
        nop: NopSpec { mnemonic: "only_nop", operands: &[] },
    }];
    assert_eq!(
        Registry::build(TYPES, &["only"]).unwrap_err(),
        ConfigError::VocabularyTooSmall { token: "only_op", len: 1 }
    );
}

#[test]
fn zero_width_number_is_rejected() {
    const NONE: TokenType = TokenType::signed("none", 0);
    static TYPES: &[InstSpec] = &[InstSpec {
        name: "alu",
        opcode: TokenType::enumeration("alu_op", &["clr", "alu_nop"]),
        operands: &[REG, NONE],
        formats: &[
            Format { mnemonic: "clr", operands: &[REG, NONE], summary: "" },
            Format { mnemonic: "alu_nop", operands: &[], summary: "" },
        ],
        nop: NopSpec { mnemonic: "alu_nop", operands: &[] },
    }];
    assert_eq!(Registry::build(TYPES, &["alu"]).unwrap_err(), ConfigError::ZeroWidth { token: "none" });
}

#[test]
fn slot_names_must_exist() {
    assert_eq!(
        Registry::build(TOY, &["alu", "fpu"]).unwrap_err(),
        ConfigError::UnknownSlotType { name: "fpu" }
    );
}

#[test]
fn type_without_slot_is_not_permitted() {
    let reg = toy(&["alu"]);
    let lines = parse_source("add r0 r1;\n  jmp 0;;").unwrap();
    let err = Assembler::with_registry(reg, AsmConfig::default()).assemble(&lines).unwrap_err();
    assert!(matches!(err, AsmError::SlotNotPermitted { inst_type: "br", .. }), "{err}");
}
