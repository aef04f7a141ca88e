//! cfb-identity
//!
//! Player identity derivation and position normalization.
//!
//! Deterministic, pure logic. No IO.

mod name;
mod position;

pub use name::{derive_id, name_key, normalize_name, ID_HEX_LEN, NAME_SUFFIXES};
pub use position::{normalize_position, POSITION_TABLE};
