pub mod browser;
pub mod error;
pub mod intent;
pub mod source;

pub use browser::*;
pub use error::*;
pub use intent::*;
pub use source::*;
