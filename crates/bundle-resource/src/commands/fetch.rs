use crate::cli::InArgs;
use crate::protocol::{read_request, write_response};
use anyhow::{Context, Result};
use bundle_core::InRequest;
use bundle_transfer::{run_get, ImgpkgCli};
use std::io::{Read, Write};

pub async fn run<R: Read, W: Write>(args: &InArgs, input: R, output: W) -> Result<()> {
    let request: InRequest = read_request(input).context("Decoding request")?;

    let settings = args.transfer.settings();
    let imgpkg = ImgpkgCli::locate(&settings).context("Running get")?;
    let response = run_get(&imgpkg, &request, &args.destination, &settings)
        .await
        .context("Running get")?;

    write_response(output, &response).context("Encoding result")?;
    Ok(())
}
