//! Session commands.

use std::io::BufRead;

use secrecy::SecretString;
use tracing::warn;

use shopfront_storefront::state::AppState;
use shopfront_storefront::sync::{AuthTransition, Refresh};

use super::CommandError;

/// Environment variable holding the login password.
pub const PASSWORD_ENV: &str = "STOREFRONT_PASSWORD";

/// Read the login password from stdin or [`PASSWORD_ENV`].
///
/// The password is never taken from argv, where `ps` and shell history
/// would expose it.
pub fn read_password(from_stdin: bool) -> Result<SecretString, CommandError> {
    if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        return password_from(Some(line));
    }
    password_from(std::env::var(PASSWORD_ENV).ok())
}

fn password_from(raw: Option<String>) -> Result<SecretString, CommandError> {
    let raw = raw.ok_or(CommandError::MissingPassword)?;
    let password = raw.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CommandError::MissingPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Log in, then load the cart and wishlist for the new session.
///
/// A shopper who is already logged in gets fresh tokens but no reload.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &SecretString,
) -> Result<(), CommandError> {
    let mut transition = AuthTransition::default();
    transition.observe(state.session().is_authenticated());

    state.api().login(email, password).await?;

    if transition.observe(state.session().is_authenticated()) {
        let stores: [&dyn Refresh; 2] = [&**state.cart(), &**state.wishlist()];
        for store in stores {
            if let Some(err) = store.refresh().await.error() {
                warn!(store = store.name(), error = %err, "Initial load failed");
            }
        }
    }

    super::cart::print_cart(state);
    Ok(())
}

/// End the session. Cached cart and wishlist stay on disk.
pub fn logout(state: &AppState) {
    state.api().logout();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_password_strips_line_ending() {
        let password = password_from(Some("hunter2 \r\n".to_string())).unwrap();
        assert_eq!(password.expose_secret(), "hunter2 ");
    }

    #[test]
    fn test_missing_or_blank_password() {
        assert!(matches!(password_from(None), Err(CommandError::MissingPassword)));
        assert!(matches!(
            password_from(Some("\n".to_string())),
            Err(CommandError::MissingPassword)
        ));
    }
}
