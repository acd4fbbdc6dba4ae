pub mod assembly;
pub mod chunk;
pub mod fec;
pub mod frame;
