//! Shared helpers that are independent of the metadata model.

/// Decompression codecs for protector payloads
pub mod decompress;
