use crate::cli::CheckArgs;
use crate::protocol::{read_request, write_response};
use anyhow::{Context, Result};
use bundle_core::CheckRequest;
use bundle_image::run_check_with_timeout;
use std::io::{Read, Write};
use tracing::debug;

pub async fn run<R: Read, W: Write>(args: &CheckArgs, input: R, output: W) -> Result<()> {
    let request: CheckRequest = read_request(input).context("Decoding request")?;
    debug!("Checking {}", request.source.repository);

    let response = run_check_with_timeout(&request, args.http_timeout)
        .await
        .context("Running check")?;

    write_response(output, &response).context("Encoding result")?;
    Ok(())
}
