//! Thin seams to the external tools that do the actual rasterizing and
//! video muxing (§1, §6 — explicitly out of scope for this crate's own
//! logic). Everything upstream of this module works in terms of tile
//! payload bytes and frame directories; these traits are where that
//! stops and an external process takes over.

pub mod barcode;
pub mod muxer;
