//! Credential model -> entity mapper

use sims_core::entities::{Credential, IdentityMetadata};

use crate::models::CredentialModel;

impl From<CredentialModel> for Credential {
    fn from(model: CredentialModel) -> Self {
        // Metadata is written by us; a malformed blob degrades to empty
        let metadata: IdentityMetadata =
            serde_json::from_value(model.metadata).unwrap_or_default();

        Credential {
            user_id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            metadata,
            created_at: model.created_at,
        }
    }
}
