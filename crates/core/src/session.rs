//! Authentication state.
//!
//! The identity provider reports sign-in and sign-out events; this module turns them into an
//! explicit state machine:
//!
//! | From            | `SignedIn(id)`      | `SignedOut` |
//! |-----------------|---------------------|-------------|
//! | `Unknown`       | `Authenticated(id)` | `Anonymous` |
//! | `Authenticated` | `Authenticated(id)` | `Anonymous` |
//! | `Anonymous`     | `Authenticated(id)` | `Anonymous` |
//!
//! `Unknown` is the only initial state and there is no terminal state. [`AuthStateHub`]
//! publishes the current state to any number of [`AuthSubscription`]s; dropping a
//! subscription tears it down.

use crate::constants::ANONYMOUS_LABEL;
use pdfshare_types::{EmailAddress, OwnerId};
use tokio::sync::watch;

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub owner_id: OwnerId,
    pub email: Option<EmailAddress>,
}

impl Identity {
    pub fn new(owner_id: OwnerId, email: Option<EmailAddress>) -> Self {
        Self { owner_id, email }
    }

    /// Label recorded on comments posted by this identity.
    pub fn author_label(&self) -> &str {
        self.email
            .as_ref()
            .map(EmailAddress::as_str)
            .unwrap_or(ANONYMOUS_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// The provider has not reported yet.
    #[default]
    Unknown,
    Authenticated(Identity),
    Anonymous,
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Unknown | AuthState::Anonymous => None,
        }
    }

    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.identity().map(|identity| &identity.owner_id)
    }

    /// The state after `event`. Every event is accepted from every state.
    pub fn apply(&self, event: AuthEvent) -> AuthState {
        match event {
            AuthEvent::SignedIn(identity) => AuthState::Authenticated(identity),
            AuthEvent::SignedOut => AuthState::Anonymous,
        }
    }
}

/// Identity-provider callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Process-lifetime publisher of [`AuthState`].
#[derive(Debug)]
pub struct AuthStateHub {
    tx: watch::Sender<AuthState>,
}

impl Default for AuthStateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::Unknown);
        Self { tx }
    }

    /// Applies a provider event and notifies subscribers.
    pub fn publish(&self, event: AuthEvent) -> AuthState {
        let next = self.tx.borrow().apply(event);
        self.tx.send_replace(next.clone());
        tracing::debug!(state = ?next, "auth state changed");
        next
    }

    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// A live view of the hub's state. Dropping it unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: watch::Receiver<AuthState>,
}

impl AuthSubscription {
    pub fn current(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// Waits for the next state change. Returns `None` once the hub has been dropped.
    pub async fn changed(&mut self) -> Option<AuthState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
