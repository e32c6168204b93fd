use super::{AppContext, TOKEN_KEY, ui};
use crate::core::records::LoginRequest;
use anyhow::{Context, Result};
use tracing::info;

pub async fn login(
    ctx: &AppContext,
    email: &str,
    password: Option<String>,
    code: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let term = console::Term::stderr();
            term.write_str("Password: ")?;
            term.read_secure_line()
                .context("Failed to read password")?
        }
    };

    let response = ctx
        .api()
        .login(&LoginRequest {
            email: email.to_string(),
            password,
            two_factor_code: code,
        })
        .await?;

    ctx.clear_user_data().await;
    ctx.session()
        .put(TOKEN_KEY, response.token.as_bytes(), None)
        .await;
    info!("Stored session for {}", response.user.email);
    println!(
        "Signed in as {}",
        ui::style_text(&response.user.email, ui::StyleType::TotalLabel)
    );
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.clear_user_data().await;
    match ctx.token_override() {
        Some(source) => println!(
            "Cleared the stored session, but a token from {source} is still used. {}",
            ui::style_text("Remove it to sign out completely.", ui::StyleType::Error)
        ),
        None => println!("Signed out"),
    }
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    if !ctx.api().has_token() {
        anyhow::bail!("Not signed in. Run `fintrack login` first.");
    }
    let user = ctx.api().current_user().await?;
    let name = user.name.as_deref().unwrap_or("-");
    let two_factor = if user.two_factor_enabled {
        ui::style_text("enabled", ui::StyleType::Success)
    } else {
        ui::style_text("disabled", ui::StyleType::Subtle)
    };
    println!("{} <{}>", name, user.email);
    println!("Two-factor authentication: {two_factor}");
    Ok(())
}
