//! Built-in Handlebars templates for Debian packaging.
//!
//! Both templates render with strict mode enabled; every field they reference
//! is always present in the render data (optional values are `null`).

/// Freedesktop.org desktop entry, installed to `/usr/share/applications`.
pub const DESKTOP_TEMPLATE: &str = "[Desktop Entry]
Type=Application
Version=1.0
Name={{display_name}}
{{#if generic_name}}GenericName={{generic_name}}
{{/if}}Comment={{summary}}
Exec={{exec}}
{{#if icon}}Icon={{icon}}
{{/if}}Terminal={{terminal}}
{{#if categories}}Categories={{categories}}
{{/if}}{{#if mime_types}}MimeType={{mime_types}}
{{/if}}";

/// Debian binary package control file.
pub const CONTROL_TEMPLATE: &str = "Package: {{package}}
Version: {{version}}
Section: {{section}}
Priority: {{priority}}
Architecture: {{architecture}}
Maintainer: {{maintainer}}
{{#if homepage}}Homepage: {{homepage}}
{{/if}}{{#if depends}}Depends: {{depends}}
{{/if}}{{#if recommends}}Recommends: {{recommends}}
{{/if}}Description: {{summary}}
{{#if extended_description}}{{extended_description}}
{{/if}}";
