//! Document model — evidentiary attachments to an [`crate::models::asset::Asset`].
//!
//! Deleting an asset (permitted only in `Draft`) cascades
//! to its documents; that cascade is implemented by
//! `crate::lifecycle::AssetLifecycle::delete`, not by this type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Appraisal,
    LegalOpinion,
    FinancialStatement,
    TitleDeed,
    Insurance,
    Prospectus,
    TermSheet,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    asset_id: Uuid,
    document_type: DocumentType,
    name: String,
    storage_key: String,
    mime_type: String,
    size_bytes: u64,
    uploaded_by: Uuid,
    created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        asset_id: Uuid,
        document_type: DocumentType,
        name: String,
        storage_key: String,
        mime_type: String,
        size_bytes: u64,
        uploaded_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id,
            document_type,
            name,
            storage_key,
            mime_type,
            size_bytes,
            uploaded_by,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn asset_id(&self) -> Uuid {
        self.asset_id
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn uploaded_by(&self) -> Uuid {
        self.uploaded_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
