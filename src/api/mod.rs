pub mod auth;
pub mod error;
pub mod favorites;
pub mod movies;

pub use auth::*;
pub use error::*;
pub use favorites::*;
pub use movies::*;
