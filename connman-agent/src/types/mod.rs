//! Protocol constants and the tagged payload representation.

pub mod constants;
pub mod payload;
