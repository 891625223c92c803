use crate::cli::OutArgs;
use crate::protocol::{read_request, write_response};
use anyhow::{Context, Result};
use bundle_core::OutRequest;
use bundle_transfer::{run_put, ImgpkgCli};
use std::io::{Read, Write};

pub async fn run<R: Read, W: Write>(args: &OutArgs, input: R, output: W) -> Result<()> {
    let request: OutRequest = read_request(input).context("Decoding request")?;

    let settings = args.transfer.settings();
    let imgpkg = ImgpkgCli::locate(&settings).context("Running put")?;
    let response = run_put(&imgpkg, &request, &args.source, &settings)
        .await
        .context("Running put")?;

    write_response(output, &response).context("Encoding result")?;
    Ok(())
}
