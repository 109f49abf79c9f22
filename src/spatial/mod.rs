mod index;
mod iter;

pub use index::*;
pub use iter::*;
