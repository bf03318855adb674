//! Platform-specific packaging implementations.
//!
//! | Platform | Package Types | Module |
//! |----------|--------------|---------|
//! | Linux | .deb | [`linux`] |
//!
//! The writer is pure Rust (`ar`, `tar`, `flate2`) and does not shell out to
//! `dpkg-deb`, so packages can be produced on any host.

pub mod linux;
