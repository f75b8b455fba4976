//! Concrete cipher instances used only by tests and the CLI's built-in
//! default path. The core crate never hardcodes a cipher (spec §1's scope
//! split keeps `L1`/`L2`/the injections externally supplied); everything
//! here is a consumer of [`crate::cipher::CipherDescription`], not part of
//! the search engine itself.

pub mod neoalzette;
