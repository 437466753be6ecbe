pub mod macros;
pub mod meeting;
pub mod time;

pub use meeting::*;
pub use time::*;
