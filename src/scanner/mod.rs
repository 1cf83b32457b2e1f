//! Static source scanning: raw module references and their classification.

pub mod classify;
pub mod source;

pub use classify::{classify, ModuleRef};
pub use source::{scan_file, RawReference, RefForm, References};
