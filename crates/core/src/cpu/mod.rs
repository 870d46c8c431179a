pub mod rv32;

pub use rv32::Rv32;
