//! Window target resolver
//!
//! Turns a [`SelectionMode`] into exactly one top-level window: a direct
//! child of the root, never the root itself and never a nested frame.

use crate::backend::WindowBackend;
use crate::core::request::{SelectionMode, WindowId};

/// Upper bound on parent links followed before giving up on a broken tree
const MAX_DEPTH: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid window id '{input}' (expected decimal or 0x-prefixed hex)")]
    InvalidIdentifier { input: String },

    #[error("no window name contains '{pattern}'")]
    WindowNotFound { pattern: String },

    #[error("the window manager reports no focused window")]
    NoActiveWindow,

    #[error("cannot query the focused window: {source}")]
    ActiveWindowQueryFailed { source: anyhow::Error },

    #[error("window selection failed: {source}")]
    PickerFailed { source: anyhow::Error },

    #[error("the root window cannot be made transparent")]
    RootWindowSelected,

    #[error("cannot look up window 0x{window:x} in the window tree: {source}")]
    WindowTreeLookupFailed { window: WindowId, source: anyhow::Error },

    #[error("no top-level ancestor found for window 0x{window:x}")]
    AncestorNotFound { window: WindowId },
}

impl ResolveError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ResolveError::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            ResolveError::WindowNotFound { .. } => "WINDOW_NOT_FOUND",
            ResolveError::NoActiveWindow => "NO_ACTIVE_WINDOW",
            ResolveError::ActiveWindowQueryFailed { .. } => "ACTIVE_WINDOW_QUERY_FAILED",
            ResolveError::PickerFailed { .. } => "PICKER_FAILED",
            ResolveError::RootWindowSelected => "ROOT_WINDOW_SELECTED",
            ResolveError::WindowTreeLookupFailed { .. } => "WINDOW_TREE_LOOKUP_FAILED",
            ResolveError::AncestorNotFound { .. } => "ANCESTOR_NOT_FOUND",
        }
    }
}

/// Parse a window id as typed: `0x1a00003` or `27262979`, whitespace allowed
pub fn parse_window_id(input: &str) -> Result<WindowId, ResolveError> {
    let trimmed = input.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            WindowId::from_str_radix(hex, 16).ok()
        }
        Some(_) => None,
        None if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) => {
            trimmed.parse::<WindowId>().ok()
        }
        None => None,
    };

    parsed.ok_or_else(|| ResolveError::InvalidIdentifier {
        input: input.to_string(),
    })
}

/// Resolve the selection to a top-level window
pub async fn resolve(backend: &dyn WindowBackend, mode: &SelectionMode) -> Result<WindowId, ResolveError> {
    let raw = match mode {
        SelectionMode::Interactive => backend
            .pick_window()
            .await
            .map_err(|source| ResolveError::PickerFailed { source })?,
        SelectionMode::Current => backend
            .active_window()
            .await
            .map_err(|source| ResolveError::ActiveWindowQueryFailed { source })?
            .ok_or(ResolveError::NoActiveWindow)?,
        SelectionMode::ByName(pattern) => find_by_name(backend, pattern).await?,
        SelectionMode::ById(input) => parse_window_id(input)?,
    };

    tracing::debug!("Selection {:?} resolved to 0x{:x}", mode, raw);
    top_level(backend, raw).await
}

/// First window, in tree order, whose name contains `pattern`
async fn find_by_name(backend: &dyn WindowBackend, pattern: &str) -> Result<WindowId, ResolveError> {
    let root = backend.root();
    let nodes = backend
        .enumerate_tree()
        .await
        .map_err(|source| ResolveError::WindowTreeLookupFailed { window: root, source })?;

    for node in nodes {
        // Windows can vanish between the snapshot and the name lookup
        match backend.window_name(node.id).await {
            Ok(Some(name)) if name.contains(pattern) => return Ok(node.id),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping 0x{:x} during name lookup: {}", node.id, e),
        }
    }

    Err(ResolveError::WindowNotFound {
        pattern: pattern.to_string(),
    })
}

/// Walk parent links up to the ancestor directly below the root
pub async fn top_level(backend: &dyn WindowBackend, window: WindowId) -> Result<WindowId, ResolveError> {
    if window == backend.root() {
        return Err(ResolveError::RootWindowSelected);
    }

    let mut current = window;
    for _ in 0..MAX_DEPTH {
        let info = backend
            .window_info(current)
            .await
            .map_err(|source| ResolveError::WindowTreeLookupFailed { window: current, source })?;

        if info.is_root {
            return Err(ResolveError::RootWindowSelected);
        }

        match info.parent {
            None => return Ok(current),
            Some(parent) if parent == backend.root() => {
                if current != window {
                    tracing::debug!("Window 0x{:x} belongs to top-level 0x{:x}", window, current);
                }
                return Ok(current);
            }
            Some(parent) => current = parent,
        }
    }

    Err(ResolveError::AncestorNotFound { window })
}
