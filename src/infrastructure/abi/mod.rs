//! ABI infrastructure - override scanning and calldata decoding

mod decoder;
mod scanner;

pub use decoder::AlloyAbiDecoder;
pub use scanner::AbiScanner;
