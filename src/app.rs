//! Normalized request -> resolved window -> applied action

use crate::backend::WindowBackend;
use crate::core::errors::Result;
use crate::core::request::{Action, CanonicalRequest};
use crate::opacity::{self, Report};
use crate::resolver;

/// Carry out one request against the windowing system
pub async fn run(backend: &dyn WindowBackend, request: &CanonicalRequest) -> Result<Report> {
    let operand = request.opacity.as_ref();

    // Before any picking, so the user is not asked to click for nothing
    opacity::check_operand(request.action, operand)?;

    let window = match request.action {
        Action::Reset => None,
        _ => Some(resolver::resolve(backend, &request.selection).await?),
    };

    Ok(opacity::apply(backend, request.action, window, operand).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Parsed, normalize};
    use crate::backend::OPACITY_PROPERTY;
    use crate::backend::memory::MemoryBackend;
    use crate::core::errors::Error;
    use crate::core::request::WindowId;
    use crate::opacity::percent_to_cardinal;
    use crate::resolver::ResolveError;

    const ROOT: WindowId = 0x100;
    const FRAME: WindowId = 0x400001;
    const CLIENT: WindowId = 0x1a00003;
    const EDITOR: WindowId = 0x500001;

    fn desktop() -> MemoryBackend {
        MemoryBackend::new(ROOT)
            .with_window(FRAME, ROOT)
            .with_window(CLIENT, FRAME)
            .with_name(CLIENT, "xterm")
            .with_window(EDITOR, ROOT)
            .with_name(EDITOR, "notes - Editor")
    }

    async fn invoke(backend: &MemoryBackend, args: &[&str]) -> Result<Report> {
        let request = match normalize(args.iter().copied())? {
            Parsed::Request(request) => request,
            Parsed::Help => panic!("unexpected help"),
        };
        run(backend, &request).await
    }

    #[tokio::test]
    async fn test_bare_opacity_on_picked_window() {
        let backend = desktop().with_picked(CLIENT);
        let report = invoke(&backend, &["75"]).await.unwrap();
        assert_eq!(report, Report::Set { window: FRAME, percent: 75 });
        assert_eq!(
            backend.property(FRAME, OPACITY_PROPERTY),
            Some(percent_to_cardinal(75))
        );
    }

    #[tokio::test]
    async fn test_relative_on_focused_window() {
        let backend = desktop()
            .with_active(CLIENT)
            .with_property(FRAME, OPACITY_PROPERTY, percent_to_cardinal(50));
        invoke(&backend, &["-c", "+20"]).await.unwrap();
        assert_eq!(
            invoke(&backend, &["--current", "--get"]).await.unwrap(),
            Report::Opacity(70)
        );
    }

    #[tokio::test]
    async fn test_by_name_and_id() {
        let backend = desktop();
        invoke(&backend, &["--name=Editor", "30%"]).await.unwrap();
        assert_eq!(
            invoke(&backend, &["-g", "-w", &format!("0x{EDITOR:x}")]).await.unwrap(),
            Report::Opacity(30)
        );
        invoke(&backend, &["-d", "-n", "notes"]).await.unwrap();
        assert_eq!(backend.property(EDITOR, OPACITY_PROPERTY), None);
    }

    #[tokio::test]
    async fn test_missing_operand_is_checked_before_picking() {
        // No picked window: reaching the picker would fail differently
        let backend = desktop();
        let err = invoke(&backend, &[]).await.unwrap_err();
        assert_eq!(err.error_code(), "MISSING_OPERAND");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_reset_does_not_resolve() {
        let backend = desktop()
            .with_property(FRAME, OPACITY_PROPERTY, 1)
            .with_property(EDITOR, OPACITY_PROPERTY, 2);
        let report = invoke(&backend, &["-r", "-w", "garbage"]).await.unwrap();
        assert_eq!(report, Report::Reset { cleared: 3, skipped: 0 });
        assert_eq!(backend.property(FRAME, OPACITY_PROPERTY), None);
        assert_eq!(backend.property(EDITOR, OPACITY_PROPERTY), None);
    }

    #[tokio::test]
    async fn test_invalid_identifier() {
        let backend = desktop();
        let err = invoke(&backend, &["-w", "0xnothex", "50"]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Resolve(ResolveError::InvalidIdentifier { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_rejection_exit_status() {
        let backend = desktop().with_active(EDITOR).rejecting(EDITOR);
        let err = invoke(&backend, &["-c", "10"]).await.unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }
}
