//! Linux packaging support for the `.deb` format.
//!
//! # Modules
//!
//! - [`debian`]: the native `.deb` archive writer
//! - [`freedesktop`]: FreeDesktop.org desktop entry helpers
//! - `template`: built-in templates for the desktop entry and control file
//!
//! # Output Location
//!
//! Packages are written to `<output>/<name>_<version>.deb`, e.g.
//! `dist/demo_1.0.0.deb`.

pub mod debian;
pub mod freedesktop;
pub(crate) mod template;
