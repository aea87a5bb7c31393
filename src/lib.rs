//! opacityctl - query and change X11 window opacity
//!
//! A window is chosen by clicking it, by focus, by name or by id, walked up
//! to its top-level frame, and then its `_NET_WM_WINDOW_OPACITY` property is
//! read, set, adjusted, toggled or removed.
//!
//! ## Pipeline
//!
//! - [`args`] normalizes the command line into a [`CanonicalRequest`](crate::core::request::CanonicalRequest)
//! - [`resolver`] turns the selection into one top-level window
//! - [`opacity`] applies the action through a [`backend::WindowBackend`]

pub mod app;
pub mod args;
pub mod backend;
pub mod core;
pub mod opacity;
pub mod resolver;
