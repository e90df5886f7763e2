use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

use kalita_types::api::AuthResponse;
use kalita_types::events::AuthEvent;
use kalita_types::models::UserProfile;

use crate::client::KalitaClient;
use crate::error::ClientError;

/// Current user and session for one client, plus a stream of auth changes.
pub struct AuthSession {
    client: KalitaClient,
    pub user: Option<UserProfile>,
    pub expires_at: Option<DateTime<Utc>>,
    pub loading: bool,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthSession {
    pub fn new(client: KalitaClient) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            client,
            user: None,
            expires_at: None,
            loading: true,
            events,
        }
    }

    /// Receive auth changes. Dropping the receiver ends the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.client.token()
    }

    /// Resolve the user behind a token the client already holds. A token the
    /// server no longer accepts is dropped.
    pub async fn mount(&mut self) {
        self.loading = true;
        if self.client.token().is_some() {
            match self.client.current_user().await {
                Ok(user) => self.user = Some(user),
                Err(e) => {
                    debug!("stored session rejected: {}", e);
                    if e.is_unauthorized() {
                        self.end_session();
                    }
                }
            }
        }
        self.loading = false;
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        self.loading = true;
        let result = self.client.sign_in(email, password).await;
        self.loading = false;
        if let Ok(auth) = &result {
            self.start_session(auth);
        }
        result
    }

    pub async fn sign_up(&mut self, email: &str, password: &str, full_name: &str) -> Result<AuthResponse, ClientError> {
        self.loading = true;
        let result = self.client.sign_up(email, password, full_name).await;
        self.loading = false;
        if let Ok(auth) = &result {
            self.start_session(auth);
        }
        result
    }

    /// Ends the local session even when the server call fails.
    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.loading = true;
        let result = match self.client.token() {
            Some(_) => self.client.sign_out().await,
            None => Ok(()),
        };
        self.loading = false;
        self.end_session();
        result
    }

    /// Re-read the profile, picking up role changes made by an administrator.
    pub async fn refresh_user(&mut self) -> Result<UserProfile, ClientError> {
        match self.client.current_user().await {
            Ok(user) => {
                if self.user.as_ref() != Some(&user) {
                    let _ = self.events.send(AuthEvent::UserUpdated { user: user.clone() });
                }
                self.user = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.end_session();
                }
                Err(e)
            }
        }
    }

    /// Display hint only. Every admin operation is checked by the server
    /// against the stored role.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_admin)
    }

    fn start_session(&mut self, auth: &AuthResponse) {
        self.client.set_token(Some(auth.token.clone()));
        self.user = Some(auth.user.clone());
        self.expires_at = Some(auth.expires_at);
        info!("signed in as {}", auth.user.email);
        let _ = self.events.send(AuthEvent::SignedIn { user: auth.user.clone() });
    }

    fn end_session(&mut self) {
        let was_signed_in = self.user.is_some() || self.client.token().is_some();
        self.client.set_token(None);
        self.user = None;
        self.expires_at = None;
        if was_signed_in {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }
}
