//! Text normalization and the correction dictionary.
pub mod normalizer;
pub mod word_dict;

pub use normalizer::{ascii_only, fold_ascii, NormalizeOptions, Normalizer, TextKind};
pub use word_dict::{merge_word_dicts, WordDict};
