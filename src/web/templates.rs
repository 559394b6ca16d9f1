//! HTML templates for the web UI.
//!
//! The page shell is embedded at compile time using `include_str!`; dynamic
//! content is rendered into it by [`super::render`].

/// The base HTML shell with navigation and layout. Contains `%TITLE%`,
/// `%NAV%`, and `%CONTENT%` slots.
pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");
