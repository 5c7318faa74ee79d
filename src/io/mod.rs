mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{decode_document, load_document};
pub use output::{OutputDestination, OutputOptions, emit};
