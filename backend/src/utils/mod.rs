pub mod tag;
pub mod time;

pub use time::*;
