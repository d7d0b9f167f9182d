//! Owner listing.
//!
//! Keeps an owner's displayed document list in step with authentication state and registry
//! fetches. The list is only ever populated for `AuthState::Authenticated`.

use crate::search::filter_by_display_name;
use crate::{AuthState, AuthSubscription, Document, DocumentRegistry, ShareError, ShareResult};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStatus {
    /// Waiting for the identity provider
    CheckingAuthentication,
    /// No signed-in user; the caller should be sent to sign in
    LoginRequired,
    /// The list reflects the last successful fetch
    Ready,
}

pub struct OwnerListing {
    registry: Arc<dyn DocumentRegistry>,
    auth: AuthState,
    status: ListingStatus,
    documents: Vec<Document>,
    search: String,
}

impl OwnerListing {
    pub fn new(registry: Arc<dyn DocumentRegistry>) -> Self {
        Self {
            registry,
            auth: AuthState::Unknown,
            status: ListingStatus::CheckingAuthentication,
            documents: Vec::new(),
            search: String::new(),
        }
    }

    pub fn status(&self) -> &ListingStatus {
        &self.status
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Documents matching the current search, in creation order.
    pub fn visible(&self) -> Vec<&Document> {
        filter_by_display_name(&self.documents, &self.search)
    }

    /// Applies a new authentication state, fetching when it is `Authenticated`.
    ///
    /// The list is cleared on every transition. If the fetch that follows sign-in fails, the
    /// error is returned and the listing stays `Ready` with an empty list.
    pub fn on_auth_state(&mut self, auth: AuthState) -> ShareResult<()> {
        self.documents.clear();
        self.status = match &auth {
            AuthState::Unknown => ListingStatus::CheckingAuthentication,
            AuthState::Anonymous => ListingStatus::LoginRequired,
            AuthState::Authenticated(_) => ListingStatus::Ready,
        };
        self.auth = auth;

        if self.status == ListingStatus::Ready {
            self.refresh()?;
        }
        Ok(())
    }

    /// Re-fetches the owner's documents, e.g. after an upload.
    ///
    /// On failure the error is returned and the list from the last successful fetch is kept.
    pub fn refresh(&mut self) -> ShareResult<()> {
        let owner = self
            .auth
            .owner_id()
            .ok_or_else(|| ShareError::Unauthorized("sign in to list documents".into()))?;

        let mut documents = self.registry.list_by_owner(owner)?;
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        self.documents = documents;
        Ok(())
    }

    /// Waits for the next state on `subscription` and applies it.
    ///
    /// Returns `None` once the publishing hub has gone away.
    pub async fn follow(&mut self, subscription: &mut AuthSubscription) -> Option<ShareResult<()>> {
        let state = subscription.changed().await?;
        Some(self.on_auth_state(state))
    }
}
