pub mod qoe;

pub use qoe::*;
