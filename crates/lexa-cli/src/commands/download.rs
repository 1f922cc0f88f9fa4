use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::context::AppContext;
use crate::GlobalArgs;

pub async fn run(
    ctx: &AppContext,
    args: &GlobalArgs,
    link: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let credential = ctx.credential(args).await?;
    let service = ctx.drafting_service(credential, out);

    let path = service
        .download(link)
        .await
        .with_context(|| format!("Failed to download '{}'", link))?;
    println!("{}", format!("✓ Saved {}", path.display()).green());
    Ok(())
}
