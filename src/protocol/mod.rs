//! Protocol module for decoding characteristic payloads.
//!
//! ESS characteristics carry bare little-endian integers, so the only
//! wire format this crate owns is the integer decoder.

pub mod decoder;

pub use decoder::{decode, decode_signed, decode_unsigned, Sample, Signedness};
