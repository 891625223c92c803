//! Fetch a bundle version into the destination directory

use bundle_resource::cli::InArgs;
use bundle_resource::{commands, init_tracing, report};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = InArgs::parse();
    init_tracing(args.log.verbose, args.log.quiet);

    report(commands::fetch::run(&args, std::io::stdin().lock(), std::io::stdout().lock()).await)
}
