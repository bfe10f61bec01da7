//! Command handlers for the GoBarber CLI.
//!
//! `App` ties the loaded configuration to the session manager in scope and
//! the API client, and implements one method per subcommand.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use gobarber_core::{use_session, ApiClient, Config, Credentials, ProfileUpdate, SessionManager};

pub struct App {
    config: Config,
    api: ApiClient,
    session: Arc<SessionManager>,
}

impl App {
    /// Build the app from the session manager of the enclosing provider and
    /// wait for the saved session to be restored.
    pub async fn new(config: Config, api: ApiClient) -> Result<Self> {
        let session = use_session()?;
        session.loaded().await;
        debug!(authenticated = session.is_authenticated(), "Session loaded");
        Ok(Self {
            config,
            api,
            session,
        })
    }

    /// Interactive login. Email and password fall back to prompts.
    pub async fn login(&mut self, email: Option<String>, password: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => Self::prompt_email(self.config.last_email.as_deref())?,
        };
        if email.is_empty() {
            bail!("Email is required");
        }

        let password = match password {
            Some(password) => password,
            None => Self::prompt_password()?,
        };

        eprintln!("Signing in...");
        self.session
            .sign_in(&Credentials::new(email.clone(), password))
            .await
            .context("Sign-in failed")?;

        self.config.last_email = Some(email);
        self.config.save().context("Failed to save config")?;

        if let Some(user) = self.session.user() {
            println!("Signed in as {}", user.display_name());
        }
        Ok(())
    }

    /// Sign out. Always clears storage, even when no complete session was
    /// restored, so a leftover token or user key does not survive.
    pub async fn logout(&self) -> Result<()> {
        let was_signed_in = self.session.is_authenticated();
        self.session.sign_out().await.context("Sign-out failed")?;
        if was_signed_in {
            println!("Signed out");
        } else {
            println!("Not signed in");
        }
        Ok(())
    }

    /// Print the signed-in user as JSON.
    pub fn whoami(&self) -> Result<()> {
        match self.session.user() {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("Not signed in"),
        }
        Ok(())
    }

    /// Save profile changes on the backend, then store the returned profile
    /// as the session user. Unset fields keep their current value.
    pub async fn edit_profile(
        &self,
        name: Option<String>,
        email: Option<String>,
        change_password: bool,
    ) -> Result<()> {
        let Some(current) = self.session.user() else {
            bail!("Not signed in - run `gobarber login` first");
        };

        let mut update = ProfileUpdate::new(
            name.unwrap_or(current.name),
            email.unwrap_or(current.email),
        );
        if change_password {
            let old_password = rpassword::prompt_password("Current password: ")?;
            let password = rpassword::prompt_password("New password: ")?;
            let confirmation = rpassword::prompt_password("Confirm new password: ")?;
            if password != confirmation {
                bail!("Passwords do not match");
            }
            update = update.with_password(old_password, password);
        }

        let api = self.session.authorized_client(&self.api);
        let user = api
            .update_profile(&update)
            .await
            .context("Failed to update profile")?;
        info!(user_id = %user.id, "Profile saved on backend");

        self.session.update_user(user).await?;
        println!("Profile updated");
        Ok(())
    }

    fn prompt_email(last_email: Option<&str>) -> Result<String> {
        match last_email {
            Some(last) => print!("Email [{}]: ", last),
            None => print!("Email: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        Ok(match (input.is_empty(), last_email) {
            (true, Some(last)) => last.to_string(),
            _ => input.to_string(),
        })
    }

    fn prompt_password() -> Result<String> {
        let password = rpassword::prompt_password("Password: ")?;
        Ok(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gobarber_core::storage::{MemoryStore, PersistentStore, TOKEN_KEY, USER_KEY};
    use gobarber_core::SessionProvider;

    #[tokio::test]
    async fn test_logout_clears_partial_session() {
        let store = Arc::new(MemoryStore::with_entries([(TOKEN_KEY, "stale"), (USER_KEY, "")]));
        let api = ApiClient::new("http://api.test").unwrap();
        let session = SessionManager::start(store.clone(), Arc::new(api.clone()));

        SessionProvider::scope(session, async move {
            let app = App::new(Config::default(), api).await.unwrap();
            assert!(!app.session.is_authenticated());
            app.logout().await.unwrap();
        })
        .await;

        assert!(store.is_empty().await);
        assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
    }
}
