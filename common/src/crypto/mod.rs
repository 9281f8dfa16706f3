mod address;
mod hash;
mod signature;

pub use address::*;
pub use hash::*;
pub use signature::*;
