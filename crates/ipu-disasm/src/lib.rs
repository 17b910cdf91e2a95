pub mod model;

pub use model::{branch_targets, decode_image, load_mem, load_raw_bin, Image, ImageKind};
