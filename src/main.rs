//! opacityctl - set, query and clear window opacity on X11

use std::process::ExitCode;

use opacityctl::args::{self, BIN_NAME, Parsed};
use opacityctl::core::errors::Error;
use opacityctl::opacity::Report;
use opacityctl::{app, backend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout only carries the result of --get
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let argv = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned());

    let request = match args::normalize(argv) {
        Ok(Parsed::Help) => {
            print!("{}", args::help());
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::Request(request)) => request,
        Err(e) => return fail(e.into()),
    };

    let backend = match backend::create_backend() {
        Ok(backend) => backend,
        Err(source) => return fail(Error::DisplayUnavailable { source }),
    };

    match app::run(backend.as_ref(), &request).await {
        Ok(Report::Opacity(percent)) => {
            println!("{percent}");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            tracing::debug!(?report, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fail(err: Error) -> ExitCode {
    tracing::debug!(error_code = err.error_code(), "Invocation failed");
    eprintln!("{BIN_NAME}: {err}");
    if matches!(err, Error::Args(_)) {
        eprintln!("Try '{BIN_NAME} --help' for more information.");
    }
    ExitCode::from(err.exit_code())
}
