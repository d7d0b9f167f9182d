//! JSON request and response bodies.

use pdfshare_core::{Comment, Document, SharedView};
use pdfshare_notify::{DispatchOutcome, ShareInvite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRes {
    pub id: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub stored_name: String,
    pub display_name: String,
    pub content_url: String,
    pub share_id: String,
    /// RFC 3339
    pub created_at: String,
    pub size_bytes: u64,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl From<Document> for DocumentRes {
    fn from(d: Document) -> Self {
        Self {
            id: d.id.to_string(),
            owner_id: d.owner_id.as_str().to_owned(),
            owner_email: d.owner_email.map(|e| e.as_str().to_owned()),
            stored_name: d.stored_name,
            display_name: d.display_name.into_string(),
            content_url: d.content_url,
            share_id: d.share_id.as_str().to_owned(),
            created_at: d.created_at.to_rfc3339(),
            size_bytes: d.size_bytes,
            sha256: d.sha256.as_str().to_owned(),
            media_type: d.media_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListDocumentsRes {
    pub documents: Vec<DocumentRes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentRes {
    pub id: String,
    pub document_id: String,
    pub author_label: String,
    pub text: String,
    pub created_at: String,
}

impl From<Comment> for CommentRes {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.to_string(),
            document_id: c.document_id.to_string(),
            author_label: c.author_label,
            text: c.text.into_string(),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommentsRes {
    pub comments: Vec<CommentRes>,
}

impl From<Vec<Comment>> for CommentsRes {
    fn from(comments: Vec<Comment>) -> Self {
        Self {
            comments: comments.into_iter().map(CommentRes::from).collect(),
        }
    }
}

/// What an anonymous share-link holder sees of a document.
///
/// Carries no owner identity and no storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedDocumentInfoRes {
    pub share_id: String,
    pub display_name: String,
    /// `<origin>/shared/<shareId>/content`
    pub content_url: String,
    /// RFC 3339
    pub created_at: String,
    pub size_bytes: u64,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl From<Document> for SharedDocumentInfoRes {
    fn from(d: Document) -> Self {
        Self {
            share_id: d.share_id.as_str().to_owned(),
            display_name: d.display_name.into_string(),
            content_url: d.content_url,
            created_at: d.created_at.to_rfc3339(),
            size_bytes: d.size_bytes,
            sha256: d.sha256.as_str().to_owned(),
            media_type: d.media_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SharedDocumentRes {
    pub document: SharedDocumentInfoRes,
    pub comments: Vec<CommentRes>,
}

impl From<SharedView> for SharedDocumentRes {
    fn from(view: SharedView) -> Self {
        Self {
            document: view.document.into(),
            comments: view.comments.into_iter().map(CommentRes::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateCommentReq {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShareLinkRes {
    /// `shared` or `pdf`
    pub route: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InviteReq {
    pub email: String,
}

/// Input to the `sendShareEmail` callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendShareEmailReq {
    pub email: String,
    pub pdf_name: String,
    pub share_link: String,
}

impl From<SendShareEmailReq> for ShareInvite {
    fn from(req: SendShareEmailReq) -> Self {
        Self {
            email: req.email,
            pdf_name: req.pdf_name,
            share_link: req.share_link,
        }
    }
}

/// `{success: true}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispatchRes {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DispatchOutcome> for DispatchRes {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            success: outcome.success,
            error: outcome.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Where to sign in, present on 401 responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}
