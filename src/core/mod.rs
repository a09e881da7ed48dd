//! Core relay types.

pub mod exit;
pub mod input_buffer;
pub mod terminal;
