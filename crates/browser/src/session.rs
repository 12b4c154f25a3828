//! Core session state: one browser identity, logged in or not.
//!
//! A session tracks whether its page holds an authenticated identity and
//! which username that is. Login and logout are the only operations that
//! change the state, and both are idempotent: re-login returns the stored
//! identity without touching the page, logout of a logged-out session is a
//! no-op. Action failures never change the state.

use {
    chromiumoxide::Page,
    serde_json::{Value, json},
    tracing::info,
    uuid::Uuid,
};

use crate::{
    dm::DirectMessaging,
    error::Result,
    executor::{Executor, WaitPolicy},
    outcome::Outcome,
    profile::ProfileActions,
};

const LOGIN_FORM: &str = "button.submit";
const USERNAME_FIELD: &str = ".js-username-field";
const PASSWORD_FIELD: &str = ".js-password-field";
const AUTHENTICATED_MARKER: &str = ".dashboard-left";
const LOGOUT_CONFIRM: &str = "button.js-submit";
const LOGGED_OUT_MARKER: &str = ".front-signin";

#[derive(Debug, Clone)]
enum AuthState {
    Unauthenticated,
    Authenticated {
        username: String,
        /// Opaque marker minted per login, for log correlation only.
        marker: String,
    },
}

/// One account's browser session.
#[derive(Debug)]
pub struct CoreSession {
    page: Page,
    policy: WaitPolicy,
    base_url: String,
    auth: AuthState,
}

impl CoreSession {
    pub fn new(page: Page, policy: WaitPolicy, base_url: String) -> Self {
        Self {
            page,
            policy,
            base_url,
            auth: AuthState::Unauthenticated,
        }
    }

    /// The logged-in username, if any.
    pub fn username(&self) -> Option<&str> {
        match &self.auth {
            AuthState::Authenticated { username, .. } => Some(username),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated { .. })
    }

    fn exec(&self) -> Executor<'_> {
        Executor::new(&self.page, self.policy)
    }

    /// Profile actions (follow, tweet, like, retweet, listings) on this page.
    pub fn profile(&self) -> ProfileActions<'_> {
        ProfileActions::new(self.exec(), &self.base_url, self.username())
    }

    /// Direct-message actions on this page.
    pub fn messaging(&self) -> DirectMessaging<'_> {
        DirectMessaging::new(self.exec(), &self.base_url)
    }

    /// Log in with the given credentials.
    ///
    /// Already authenticated sessions return the stored identity without any
    /// page interaction; the stored username wins over the one passed.
    pub async fn login(&mut self, username: &str, password: &str) -> Outcome {
        if let AuthState::Authenticated { username, .. } = &self.auth {
            return Outcome::success(logged_from_session(username));
        }

        match self.submit_credentials(username, password).await {
            Ok(()) => {
                let marker = Uuid::new_v4().to_string();
                info!(username, marker, "logged in");
                self.auth = AuthState::Authenticated {
                    username: username.to_owned(),
                    marker,
                };
                Outcome::success(logged_in(username))
            },
            Err(err) => Outcome::failure(&err),
        }
    }

    async fn submit_credentials(&self, username: &str, password: &str) -> Result<()> {
        let exec = self.exec();
        exec.goto(&format!("{}/login", self.base_url)).await?;
        exec.wait_for(LOGIN_FORM).await?;
        exec.type_text(USERNAME_FIELD, username).await?;
        exec.type_text(PASSWORD_FIELD, password).await?;
        exec.click(LOGIN_FORM).await?;
        exec.wait_for(AUTHENTICATED_MARKER).await?;
        Ok(())
    }

    /// Log out of the current identity.
    ///
    /// The state flips to unauthenticated only after the logged-out surface
    /// is actually observed.
    pub async fn logout(&mut self) -> Outcome {
        let (username, marker) = match &self.auth {
            AuthState::Authenticated { username, marker } => {
                (username.clone(), marker.clone())
            },
            AuthState::Unauthenticated => return Outcome::success(not_logged_in()),
        };

        match self.confirm_logout().await {
            Ok(()) => {
                self.auth = AuthState::Unauthenticated;
                info!(username, marker, "logged out");
                Outcome::success(logged_out(&username))
            },
            Err(err) => Outcome::failure(&err),
        }
    }

    async fn confirm_logout(&self) -> Result<()> {
        let exec = self.exec();
        exec.goto(&format!("{}/logout", self.base_url)).await?;
        exec.wait_for(LOGOUT_CONFIRM).await?;
        exec.click(LOGOUT_CONFIRM).await?;
        exec.wait_for(LOGGED_OUT_MARKER).await?;
        Ok(())
    }
}

fn logged_in(username: &str) -> Value {
    json!({ "username": username, "status": "Logged in" })
}

fn logged_from_session(username: &str) -> Value {
    json!({ "username": username, "status": "Logged from session" })
}

fn not_logged_in() -> Value {
    json!({ "username": null, "status": "Not logged in" })
}

fn logged_out(username: &str) -> Value {
    json!({ "username": username, "status": "Logged out" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn login_payload_shapes() {
        assert_eq!(
            logged_in("crooner"),
            json!({ "username": "crooner", "status": "Logged in" })
        );
        assert_eq!(
            logged_from_session("crooner"),
            json!({ "username": "crooner", "status": "Logged from session" })
        );
    }

    #[test]
    fn logout_payload_shapes() {
        assert_eq!(
            not_logged_in(),
            json!({ "username": null, "status": "Not logged in" })
        );
        assert_eq!(
            logged_out("crooner"),
            json!({ "username": "crooner", "status": "Logged out" })
        );
    }
}
