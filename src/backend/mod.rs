//! Window backend abstraction
//!
//! The resolver and controller never talk to the X server directly; they go
//! through [`WindowBackend`], which models the windowing system as a
//! query/set interface over a window tree with per-window properties.

#[cfg(test)]
pub(crate) mod memory;
mod x11;

use async_trait::async_trait;

use crate::core::request::WindowId;

/// Property holding a window's opacity as a 32-bit cardinal
pub const OPACITY_PROPERTY: &str = "_NET_WM_WINDOW_OPACITY";

/// Position of a window in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    /// `None` only for the root window
    pub parent: Option<WindowId>,
    pub is_root: bool,
}

/// One entry of a tree snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    pub id: WindowId,
    pub parent: WindowId,
}

/// A request the windowing system refused
///
/// Backends wrap rejected writes in this type so callers can recover the
/// protocol error code from an `anyhow::Error`.
#[derive(Debug, thiserror::Error)]
#[error("{request} rejected by the X server (error code {code})")]
pub struct RequestFailed {
    pub request: &'static str,
    pub code: u8,
}

/// Trait for window backend implementations
#[async_trait]
pub trait WindowBackend: Send + Sync {
    /// The root of the hierarchy being operated on
    fn root(&self) -> WindowId;

    /// Read a 32-bit cardinal property; `None` when it is not set
    async fn get_cardinal(&self, window: WindowId, property: &str) -> anyhow::Result<Option<u32>>;

    /// Replace a 32-bit cardinal property
    async fn set_cardinal(&self, window: WindowId, property: &str, value: u32) -> anyhow::Result<()>;

    /// Remove a property; succeeds if it was not set
    async fn remove_property(&self, window: WindowId, property: &str) -> anyhow::Result<()>;

    /// Parent link of a window
    async fn window_info(&self, window: WindowId) -> anyhow::Result<WindowInfo>;

    /// Visible name of a window, if it has one
    async fn window_name(&self, window: WindowId) -> anyhow::Result<Option<String>>;

    /// Every window below the root, depth-first pre-order
    async fn enumerate_tree(&self) -> anyhow::Result<Vec<TreeNode>>;

    /// The focused window as advertised by the window manager
    async fn active_window(&self) -> anyhow::Result<Option<WindowId>>;

    /// Let the user click a window
    async fn pick_window(&self) -> anyhow::Result<WindowId>;
}

/// Create the backend for the current environment
pub fn create_backend() -> anyhow::Result<Box<dyn WindowBackend>> {
    let display_env = std::env::var("DISPLAY").ok().filter(|d| !d.is_empty());

    if let Some(ref disp) = display_env {
        tracing::debug!("Using X11 backend (DISPLAY={})", disp);
        Ok(Box::new(x11::X11Backend::new(disp)?))
    } else {
        anyhow::bail!("DISPLAY is not set")
    }
}
