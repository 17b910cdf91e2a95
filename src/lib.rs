pub mod assembler;
pub mod bundle;
pub mod decoder;
pub mod disasm;
pub mod error;
pub mod instructions;
pub mod labels;
pub mod registry;
pub mod source;
pub mod token;

pub mod isa {
    pub mod ipu; // IPU VLIW catalog
}

pub use assembler::{AsmConfig, Assembler, Program};
pub use bundle::{Bundle, BundleWord};
pub use decoder::{decode_inst, DecodedBundle, DecodedInst};
pub use error::{AsmError, ConfigError, Location};
pub use labels::{LabelEntry, LabelTable};
pub use registry::Registry;
pub use source::{parse_source, SourceInst, SourceLine, SourceToken};
