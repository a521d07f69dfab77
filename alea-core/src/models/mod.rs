mod content;
mod draft;

pub use content::{ContentRecord, FLAT_FIELDS, RESERVED_FIELDS};
pub use draft::DraftEntry;
