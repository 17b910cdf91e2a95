//! Built-in IPU instruction catalog: operand token types, the instruction
//! types with their mnemonics, and the bundle slot order.

use crate::instructions::{Format, InstSpec, NopSpec};
use crate::token::TokenType;

pub const RX_REG: TokenType = TokenType::enumeration(
    "rx_reg_field",
    &[
        "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "mem_bypass",
    ],
);

pub const MULT_STAGE_REG: TokenType =
    TokenType::enumeration("mult_stage_reg_field", &["r0", "r1", "mem_bypass"]);

pub const LR_REG: TokenType = TokenType::enumeration(
    "lr_reg_field",
    &[
        "lr0", "lr1", "lr2", "lr3", "lr4", "lr5", "lr6", "lr7", "lr8", "lr9", "lr10", "lr11", "lr12",
        "lr13", "lr14", "lr15",
    ],
);

pub const CR_REG: TokenType = TokenType::enumeration(
    "cr_reg_field",
    &[
        "cr0", "cr1", "cr2", "cr3", "cr4", "cr5", "cr6", "cr7", "cr8", "cr9", "cr10", "cr11", "cr12",
        "cr13", "cr14", "cr15",
    ],
);

// LR or CR register, for LR arithmetic sources.
pub const LCR_REG: TokenType = TokenType::enumeration(
    "lcr_reg_field",
    &[
        "lr0", "lr1", "lr2", "lr3", "lr4", "lr5", "lr6", "lr7", "lr8", "lr9", "lr10", "lr11", "lr12",
        "lr13", "lr14", "lr15", "cr0", "cr1", "cr2", "cr3", "cr4", "cr5", "cr6", "cr7", "cr8", "cr9",
        "cr10", "cr11", "cr12", "cr13", "cr14", "cr15",
    ],
);

pub const LR_IMMEDIATE: TokenType = TokenType::signed("lr_immediate_type", 16);
pub const BREAK_IMMEDIATE: TokenType = TokenType::number("break_immediate_type", 16);
pub const LABEL: TokenType = TokenType::label("label_token");

pub const XMEM: usize = 0;
pub const MULT: usize = 1;
pub const ACC: usize = 2;
pub const MAC: usize = 3;
pub const LR: usize = 4;
pub const COND: usize = 5;
pub const BREAK: usize = 6;

pub static TYPES: &[InstSpec] = &[
    InstSpec {
        name: "xmem",
        opcode: TokenType::enumeration(
            "xmem_inst_opcode",
            &[
                "str",
                "ldr",
                "ldr_mult_reg",
                "ldr_cyclic_mult_reg",
                "ldr_mult_mask_reg",
                "str_acc_reg",
                "xmem_nop",
            ],
        ),
        operands: &[RX_REG, LR_REG, CR_REG, LR_REG],
        formats: &[
            Format { mnemonic: "str", operands: &[RX_REG, LR_REG, CR_REG], summary: "Memory[Lr + Cr] = Rx" },
            Format { mnemonic: "ldr", operands: &[RX_REG, LR_REG, CR_REG], summary: "Rx = Memory[Lr + Cr]" },
            Format {
                mnemonic: "ldr_mult_reg",
                operands: &[RX_REG, LR_REG, CR_REG],
                summary: "load a mult stage register from Memory[Lr + Cr]",
            },
            Format {
                mnemonic: "ldr_cyclic_mult_reg",
                operands: &[LR_REG, CR_REG, LR_REG],
                summary: "load the cyclic mult register at index Lr2 from Memory[Lr1 + Cr]",
            },
            Format {
                mnemonic: "ldr_mult_mask_reg",
                operands: &[LR_REG, CR_REG],
                summary: "load the accumulator mask register from Memory[Lr + Cr]",
            },
            Format {
                mnemonic: "str_acc_reg",
                operands: &[LR_REG, CR_REG],
                summary: "Memory[Lr + Cr] = accumulator",
            },
            Format { mnemonic: "xmem_nop", operands: &[], summary: "no operation" },
        ],
        nop: NopSpec { mnemonic: "xmem_nop", operands: &[] },
    },
    InstSpec {
        name: "mult",
        opcode: TokenType::enumeration("mult_inst_opcode", &["mult.ee", "mult.ev", "mult_nop"]),
        operands: &[MULT_STAGE_REG, LR_REG, LR_REG],
        formats: &[
            Format {
                mnemonic: "mult.ee",
                operands: &[MULT_STAGE_REG, LR_REG],
                summary: "result[i] = Ra[i] * RC[i + Lr1]",
            },
            Format {
                mnemonic: "mult.ev",
                operands: &[MULT_STAGE_REG, LR_REG, LR_REG],
                summary: "result[i] = Ra[i] * RC[Lr2 + i + Lr1]",
            },
            Format { mnemonic: "mult_nop", operands: &[], summary: "no operation" },
        ],
        nop: NopSpec { mnemonic: "mult_nop", operands: &[] },
    },
    InstSpec {
        name: "acc",
        opcode: TokenType::enumeration("acc_inst_opcode", &["acc", "reset_acc", "acc_nop"]),
        operands: &[LR_REG, LR_REG, LR_REG, LR_REG],
        formats: &[
            Format {
                mnemonic: "acc",
                operands: &[LR_REG, LR_REG, LR_REG, LR_REG],
                summary: "RT[Lr2 + i] += masked, shifted product",
            },
            Format { mnemonic: "reset_acc", operands: &[], summary: "clear the accumulator" },
            Format { mnemonic: "acc_nop", operands: &[], summary: "no operation" },
        ],
        nop: NopSpec { mnemonic: "acc_nop", operands: &[] },
    },
    InstSpec {
        name: "mac",
        opcode: TokenType::enumeration(
            "mac_inst_opcode",
            &["mac.ee", "mac.ev", "mac.agg", "zero_rq", "mac_nop"],
        ),
        operands: &[RX_REG, RX_REG, RX_REG, LR_REG],
        formats: &[
            Format { mnemonic: "mac.ee", operands: &[RX_REG, RX_REG, RX_REG], summary: "Rq += Ra * Rb elementwise" },
            Format {
                mnemonic: "mac.ev",
                operands: &[RX_REG, RX_REG, RX_REG, LR_REG],
                summary: "Rq += Ra * Rb[Lr]",
            },
            Format {
                mnemonic: "mac.agg",
                operands: &[RX_REG, RX_REG, RX_REG, LR_REG],
                summary: "Rq[Lr] += sum(Ra * Rb)",
            },
            Format { mnemonic: "zero_rq", operands: &[RX_REG], summary: "Rq = 0" },
            Format { mnemonic: "mac_nop", operands: &[], summary: "no operation" },
        ],
        nop: NopSpec { mnemonic: "mac_nop", operands: &[] },
    },
    InstSpec {
        name: "lr",
        opcode: TokenType::enumeration("lr_inst_opcode", &["incr", "set", "add", "sub"]),
        operands: &[LR_REG, LCR_REG, LCR_REG, LR_IMMEDIATE],
        formats: &[
            Format { mnemonic: "incr", operands: &[LR_REG, LR_IMMEDIATE], summary: "Lr = Lr + imm" },
            Format { mnemonic: "set", operands: &[LR_REG, LR_IMMEDIATE], summary: "Lr = imm" },
            Format { mnemonic: "add", operands: &[LR_REG, LCR_REG, LCR_REG], summary: "Lr = Lcr1 + Lcr2" },
            Format { mnemonic: "sub", operands: &[LR_REG, LCR_REG, LCR_REG], summary: "Lr = Lcr1 - Lcr2" },
        ],
        nop: NopSpec { mnemonic: "incr", operands: &["lr0", "0"] },
    },
    InstSpec {
        name: "cond",
        opcode: TokenType::enumeration(
            "cond_inst_opcode",
            &["beq", "bne", "blt", "bnz", "bz", "b", "br", "bkpt"],
        ),
        operands: &[LR_REG, LR_REG, LABEL],
        formats: &[
            Format { mnemonic: "beq", operands: &[LR_REG, LR_REG, LABEL], summary: "if (Lr1 == Lr2) goto label" },
            Format { mnemonic: "bne", operands: &[LR_REG, LR_REG, LABEL], summary: "if (Lr1 != Lr2) goto label" },
            Format { mnemonic: "blt", operands: &[LR_REG, LR_REG, LABEL], summary: "if (Lr1 < Lr2) goto label" },
            Format { mnemonic: "bnz", operands: &[LR_REG, LR_REG, LABEL], summary: "if (LrTest != LrBase) goto label" },
            Format { mnemonic: "bz", operands: &[LR_REG, LR_REG, LABEL], summary: "if (LrTest == LrBase) goto label" },
            Format { mnemonic: "b", operands: &[LABEL], summary: "goto label" },
            Format { mnemonic: "br", operands: &[LR_REG], summary: "goto address_in(Lr)" },
            Format { mnemonic: "bkpt", operands: &[], summary: "halt" },
        ],
        nop: NopSpec { mnemonic: "b", operands: &["+1"] },
    },
    InstSpec {
        name: "break",
        opcode: TokenType::enumeration("break_inst_opcode", &["break", "break.ifeq", "break_nop"]),
        operands: &[LR_REG, BREAK_IMMEDIATE],
        formats: &[
            Format { mnemonic: "break", operands: &[], summary: "unconditional debug break" },
            Format {
                mnemonic: "break.ifeq",
                operands: &[LR_REG, BREAK_IMMEDIATE],
                summary: "break if Lr == imm",
            },
            Format { mnemonic: "break_nop", operands: &[], summary: "no operation" },
        ],
        nop: NopSpec { mnemonic: "break_nop", operands: &[] },
    },
];

/// Slot order of a bundle, most significant first. Two LR slots.
pub static BUNDLE_SLOTS: &[&str] = &["xmem", "mult", "acc", "mac", "lr", "lr", "cond", "break"];
