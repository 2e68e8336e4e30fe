//! Data types for officeview: raw package graphs, resolved styles and the
//! render-ready model.

mod document;
mod model;
mod raw;
mod style;

pub use document::*;
pub use model::*;
pub use raw::*;
pub use style::*;
