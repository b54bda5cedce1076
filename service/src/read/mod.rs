//! Read entities definitions.

pub mod deal;
