//! Identity and token material shared across sessions and clients.

pub mod id;
pub mod token;

pub use id::*;
pub use token::*;
