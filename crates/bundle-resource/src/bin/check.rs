//! Report new bundle versions

use bundle_resource::cli::CheckArgs;
use bundle_resource::{commands, init_tracing, report};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CheckArgs::parse();
    init_tracing(args.log.verbose, args.log.quiet);

    report(commands::check::run(&args, std::io::stdin().lock(), std::io::stdout().lock()).await)
}
