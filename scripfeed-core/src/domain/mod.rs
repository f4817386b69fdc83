//! Domain types: securities and date chunks.

pub mod chunk;
pub mod security;

pub use chunk::DateChunk;
pub use security::{parse_securities, SecurityId};
