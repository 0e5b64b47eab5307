use url::Url;

use super::prompt;
use crate::models::{OAuthProvider, SignUpOutcome};
use crate::presentation::{FormError, Key, LoginForm, RegisterForm};
use crate::state::AppContext;

pub async fn cmd_login(
    ctx: &AppContext,
    email: Option<String>,
    password: Option<String>,
    provider: Option<String>,
) -> anyhow::Result<()> {
    let messages = ctx.messages;

    if let Some(provider) = provider {
        let provider: OAuthProvider = provider.parse().map_err(anyhow::Error::msg)?;
        let url = ctx.session.sign_in_with_oauth(provider)?;

        println!("{}:", messages.text(Key::OpenInBrowser));
        println!("  {url}");
        println!();

        let callback = prompt("Paste the URL you were redirected to")?;
        let callback = Url::parse(&callback)?;
        let user = ctx.session.complete_oauth(&callback).await?;
        println!("{} {}", messages.text(Key::SignedInAs), user.label());
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = match password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    match LoginForm::new(email, password).submit(&ctx.session).await {
        Ok(user) => {
            println!("{} {} <{}>", messages.text(Key::SignedInAs), user.label(), user.email);
            Ok(())
        }
        Err(FormError::Invalid(e)) => anyhow::bail!(messages.validation(&e)),
        Err(FormError::Auth(e)) => Err(e.into()),
    }
}

pub async fn cmd_register(
    ctx: &AppContext,
    email: String,
    name: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let messages = ctx.messages;
    let password = match password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    let form = RegisterForm {
        display_name: name,
        email,
        password,
    };

    match form.submit(&ctx.session).await {
        Ok(SignUpOutcome::SignedIn(session)) => {
            println!(
                "{} {} <{}>",
                messages.text(Key::SignedInAs),
                session.user.label(),
                session.user.email
            );
        }
        Ok(SignUpOutcome::ConfirmationRequired(user)) => {
            println!("{} ({})", messages.text(Key::ConfirmEmail), user.email);
        }
        Err(FormError::Invalid(e)) => anyhow::bail!(messages.validation(&e)),
        Err(FormError::Auth(e)) => return Err(e.into()),
    }

    Ok(())
}

pub async fn cmd_logout(ctx: &AppContext) -> anyhow::Result<()> {
    if ctx.session.current_user().is_none() {
        println!("{}", ctx.messages.text(Key::NotSignedIn));
        return Ok(());
    }

    ctx.session.sign_out().await?;
    println!("{}", ctx.messages.text(Key::SignedOut));
    Ok(())
}

pub fn cmd_whoami(ctx: &AppContext) {
    let messages = ctx.messages;
    match ctx.session.current_session() {
        Some(session) => {
            println!("{} {}", messages.text(Key::SignedInAs), session.user.label());
            println!("  Email:   {}", session.user.email);
            println!("  User ID: {}", session.user.id);
            println!("  Expires: {}", session.expires_at.format("%Y-%m-%d %H:%M UTC"));
        }
        None => println!("{}", messages.text(Key::NotSignedIn)),
    }
}
