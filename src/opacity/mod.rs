//! Opacity controller
//!
//! Reads and writes `_NET_WM_WINDOW_OPACITY`. Opacity is a percentage for
//! the user and a 32-bit cardinal for the compositor; an absent property
//! means fully opaque.

use crate::backend::{OPACITY_PROPERTY, RequestFailed, WindowBackend};
use crate::core::errors::EXIT_USAGE;
use crate::core::request::{Action, OpacityOperand, Sign, WindowId};

/// Property value for 100%
pub const OPAQUE: u32 = u32::MAX;

/// Opacity reported for windows without the property
pub const DEFAULT_PERCENT: u8 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("no opacity given; pass a value such as 75, +10 or -o 50")]
    MissingOperand { action: Action },

    #[error("cannot read the opacity of window 0x{window:x}: {source}")]
    PropertyReadFailed { window: WindowId, source: anyhow::Error },

    #[error("cannot write the opacity of window 0x{window:x}: {source}")]
    PropertyWriteFailed {
        window: WindowId,
        status: u8,
        source: anyhow::Error,
    },

    #[error("cannot list windows: {source}")]
    WindowTreeLookupFailed { source: anyhow::Error },

    #[error("{action:?} reached the controller without a target window")]
    NoTarget { action: Action },
}

impl ControllerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ControllerError::MissingOperand { .. } => "MISSING_OPERAND",
            ControllerError::PropertyReadFailed { .. } => "PROPERTY_READ_FAILED",
            ControllerError::PropertyWriteFailed { .. } => "PROPERTY_WRITE_FAILED",
            ControllerError::WindowTreeLookupFailed { .. } => "WINDOW_TREE_LOOKUP_FAILED",
            ControllerError::NoTarget { .. } => "NO_TARGET",
        }
    }

    fn write_failed(window: WindowId, source: anyhow::Error) -> Self {
        let status = source
            .downcast_ref::<RequestFailed>()
            .map(|rejected| rejected.code)
            .filter(|&code| code != 0)
            .unwrap_or(EXIT_USAGE);
        ControllerError::PropertyWriteFailed {
            window,
            status,
            source,
        }
    }
}

/// What an applied action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Opacity read back, in percent
    Opacity(u8),
    /// Opacity written, in percent
    Set { window: WindowId, percent: u8 },
    /// Property removed
    Cleared { window: WindowId },
    /// Property removed from every window that allowed it
    Reset { cleared: usize, skipped: usize },
}

/// `percent * 0xFFFFFFFF / 100`, rounded down
pub fn percent_to_cardinal(percent: u8) -> u32 {
    let percent = u64::from(percent.min(100));
    (percent * u64::from(OPAQUE) / 100) as u32
}

/// Nearest whole percentage for a stored cardinal
pub fn cardinal_to_percent(value: u32) -> u8 {
    let opaque = u64::from(OPAQUE);
    ((u64::from(value) * 100 + opaque / 2) / opaque) as u8
}

/// Apply an operand to the current opacity, saturating at 0 and 100
pub fn target_percent(current: u8, operand: &OpacityOperand) -> u8 {
    let magnitude = operand.magnitude.min(u64::from(u8::MAX));
    let current = u64::from(current);
    let target = match operand.sign {
        None => magnitude,
        Some(Sign::Plus) => current + magnitude,
        Some(Sign::Minus) => current.saturating_sub(magnitude),
    };
    target.min(100) as u8
}

/// Fail early when the action cannot run without an opacity
pub fn check_operand(action: Action, operand: Option<&OpacityOperand>) -> Result<(), ControllerError> {
    if action == Action::Set && operand.is_none() {
        return Err(ControllerError::MissingOperand { action });
    }
    Ok(())
}

/// Run `action` against `window`; `Reset` ignores the window
pub async fn apply(
    backend: &dyn WindowBackend,
    action: Action,
    window: Option<WindowId>,
    operand: Option<&OpacityOperand>,
) -> Result<Report, ControllerError> {
    check_operand(action, operand)?;
    let target = || window.ok_or(ControllerError::NoTarget { action });

    match action {
        Action::Get => get(backend, target()?)
            .await
            .map(|percent| Report::Opacity(percent.unwrap_or(DEFAULT_PERCENT))),
        Action::Delete => delete(backend, target()?).await,
        Action::Set => match operand {
            Some(operand) => set(backend, target()?, operand).await,
            None => Err(ControllerError::MissingOperand { action }),
        },
        Action::Toggle => toggle(backend, target()?, operand).await,
        Action::Reset => reset(backend).await,
    }
}

/// Current opacity in percent, `None` when unset
pub async fn get(backend: &dyn WindowBackend, window: WindowId) -> Result<Option<u8>, ControllerError> {
    let value = backend
        .get_cardinal(window, OPACITY_PROPERTY)
        .await
        .map_err(|source| ControllerError::PropertyReadFailed { window, source })?;
    Ok(value.map(cardinal_to_percent))
}

pub async fn delete(backend: &dyn WindowBackend, window: WindowId) -> Result<Report, ControllerError> {
    backend
        .remove_property(window, OPACITY_PROPERTY)
        .await
        .map_err(|source| ControllerError::write_failed(window, source))?;

    tracing::info!("Cleared opacity of 0x{:x}", window);
    Ok(Report::Cleared { window })
}

pub async fn set(
    backend: &dyn WindowBackend,
    window: WindowId,
    operand: &OpacityOperand,
) -> Result<Report, ControllerError> {
    let current = if operand.is_relative() {
        get(backend, window).await?.unwrap_or(DEFAULT_PERCENT)
    } else {
        DEFAULT_PERCENT
    };
    let percent = target_percent(current, operand);

    backend
        .set_cardinal(window, OPACITY_PROPERTY, percent_to_cardinal(percent))
        .await
        .map_err(|source| ControllerError::write_failed(window, source))?;

    tracing::info!("Set opacity of 0x{:x} to {}% ({})", window, percent, operand);
    Ok(Report::Set { window, percent })
}

/// Set when unset (100% by default), remove when set
pub async fn toggle(
    backend: &dyn WindowBackend,
    window: WindowId,
    operand: Option<&OpacityOperand>,
) -> Result<Report, ControllerError> {
    if get(backend, window).await?.is_some() {
        return delete(backend, window).await;
    }

    let operand = operand
        .copied()
        .unwrap_or(OpacityOperand::absolute(u64::from(DEFAULT_PERCENT)));
    set(backend, window, &operand).await
}

/// Remove opacity from every window below the root
///
/// Individual failures are expected (windows vanish, some refuse) and only
/// counted.
pub async fn reset(backend: &dyn WindowBackend) -> Result<Report, ControllerError> {
    let nodes = backend
        .enumerate_tree()
        .await
        .map_err(|source| ControllerError::WindowTreeLookupFailed { source })?;

    let mut cleared = 0;
    let mut skipped = 0;
    for node in nodes {
        match backend.remove_property(node.id, OPACITY_PROPERTY).await {
            Ok(()) => cleared += 1,
            Err(e) => {
                tracing::debug!("Could not clear opacity of 0x{:x}: {}", node.id, e);
                skipped += 1;
            }
        }
    }

    tracing::info!("Reset opacity on {} windows ({} skipped)", cleared, skipped);
    Ok(Report::Reset { cleared, skipped })
}
