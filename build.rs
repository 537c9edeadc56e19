//! Build script that embeds build metadata reported by `/health`.
//!
//! When git metadata is passed in through the environment (container builds
//! without a `.git` directory), vergen is skipped and those values are used.

use std::error::Error;
use vergen_gix::{Build, Emitter, Gix};

fn main() -> Result<(), Box<dyn Error>> {
    let provided = ["VERGEN_GIT_SHA", "VERGEN_GIT_COMMIT_TIMESTAMP"]
        .iter()
        .any(|var| std::env::var(var).is_ok());

    if provided {
        println!("cargo:warning=Using git metadata from environment variables");
        return Ok(());
    }

    Emitter::default()
        .add_instructions(&Build::all_build())?
        .add_instructions(&Gix::all_git())?
        .emit()?;
    Ok(())
}
