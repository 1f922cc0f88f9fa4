use anyhow::{bail, Result};
use colored::Colorize;
use lexa_core::AuthService;

use crate::context::AppContext;
use crate::GlobalArgs;

/// Logs in and prints the token, ready for `export LEXA_TOKEN=...`.
pub async fn login(ctx: &AppContext, args: &GlobalArgs) -> Result<()> {
    let Some(username) = args.username.as_deref() else {
        bail!("`lexa login` needs --username");
    };

    let credential = ctx.login(username).await?;
    eprintln!("{}", format!("✓ Logged in as {}", username).green());
    println!("{}", credential.access_token());
    Ok(())
}

pub async fn profile(ctx: &AppContext, args: &GlobalArgs) -> Result<()> {
    let credential = ctx.credential(args).await?;
    let user = ctx.auth.current_user(&credential).await?;

    println!("{}", user.display_name().bold());
    if let Some(email) = &user.email {
        println!("  email:  {}", email);
    }
    let role = if user.is_admin() {
        user.role.bright_magenta()
    } else {
        user.role.normal()
    };
    println!("  role:   {}", role);
    if user.has_gemini_key() {
        println!("  gemini: {}", "configured".green());
    } else {
        println!(
            "  gemini: {} (run `lexa set-gemini-key <key>`)",
            "missing".yellow()
        );
    }
    if user.disabled == Some(true) {
        println!("  {}", "This account is disabled.".red());
    }
    Ok(())
}

pub async fn set_gemini_key(ctx: &AppContext, args: &GlobalArgs, key: &str) -> Result<()> {
    let credential = ctx.credential(args).await?;
    ctx.auth.update_gemini_key(&credential, key).await?;
    println!("{}", "✓ Gemini API key saved".green());
    Ok(())
}
