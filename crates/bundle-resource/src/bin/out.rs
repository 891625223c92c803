//! Publish the source directory's bundle as a new version

use bundle_resource::cli::OutArgs;
use bundle_resource::{commands, init_tracing, report};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = OutArgs::parse();
    init_tracing(args.log.verbose, args.log.quiet);

    report(commands::publish::run(&args, std::io::stdin().lock(), std::io::stdout().lock()).await)
}
