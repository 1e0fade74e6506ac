//! Music library: the `Track` model and the directory scanner that feeds
//! the song list.

mod model;
mod scan;

pub use model::*;
pub use scan::scan;
