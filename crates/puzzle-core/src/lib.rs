pub use chess;

pub mod dataset;
pub mod puzzle;
