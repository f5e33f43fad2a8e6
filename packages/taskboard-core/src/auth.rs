//! Auth session: who the current owner is, with sign-in/sign-out.
//!
//! The identity providers themselves live outside this crate; whatever
//! verified the user hands the resulting identity to `sign_in`.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::notify::{Notification, Notifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    /// Display name, else the local part of the email, else "User".
    pub fn greeting_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
            .to_string()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity id must not be empty")]
    EmptyId,
}

pub struct AuthSession {
    current: watch::Sender<Option<Identity>>,
    notifier: Arc<dyn Notifier>,
}

impl AuthSession {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (current, _) = watch::channel(None);
        Self { current, notifier }
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Receiver that changes on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    pub fn sign_in(&self, identity: Identity) -> Result<Identity, AuthError> {
        if identity.id.trim().is_empty() {
            self.notifier
                .notify(Notification::error("Unable to sign in"));
            return Err(AuthError::EmptyId);
        }
        log::info!(
            "[taskboard.auth] Signed in {} ({})",
            identity.greeting_name(),
            identity.id
        );
        self.current.send_replace(Some(identity.clone()));
        self.notifier
            .notify(Notification::success("Successfully signed in!"));
        Ok(identity)
    }

    /// Returns the identity that was signed in, if any.
    pub fn sign_out(&self) -> Option<Identity> {
        let previous = self.current.send_replace(None);
        if let Some(identity) = &previous {
            log::info!("[taskboard.auth] Signed out {}", identity.id);
            self.notifier
                .notify(Notification::success("Successfully signed out!"));
        }
        previous
    }
}
