use clap::Parser;
use log::error;
use servefolder::args::{ShareArgs, normalize_flags};
use servefolder::config::Config;
use servefolder::version::VersionInfo;
use servefolder::{app, logging};
use std::io;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ShareArgs::parse_from(normalize_flags(std::env::args_os()));
    if args.common.version {
        print!("{}", VersionInfo::new("sharefolder"));
        return ExitCode::SUCCESS;
    }

    if let Err(err) = logging::init() {
        eprintln!("Failed to initialize logger: {}", err);
        return ExitCode::FAILURE;
    }

    let config = Config::from_share_args(args, &mut io::stdin().lock(), &mut io::stdout());
    let result = match config {
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
