use clap::Parser;
use log::error;
use servefolder::args::{ServeArgs, normalize_flags};
use servefolder::config::Config;
use servefolder::version::VersionInfo;
use servefolder::{app, logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServeArgs::parse_from(normalize_flags(std::env::args_os()));
    if args.common.version {
        print!("{}", VersionInfo::new("servefolder"));
        return ExitCode::SUCCESS;
    }

    if let Err(err) = logging::init() {
        eprintln!("Failed to initialize logger: {}", err);
        return ExitCode::FAILURE;
    }

    let result = match Config::from_serve_args(args) {
        Ok(config) => app::run(config).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
