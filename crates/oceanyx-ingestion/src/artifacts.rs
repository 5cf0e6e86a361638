//! Uploaded artifact registry.
//!
//! Holds metadata only; file bytes never pass through here.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use oceanyx_common::{Artifact, ArtifactMetadata, MimeKind, OceanyxError, Result};

/// Registration call made by the upload layer once the bytes have landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRegistration {
    pub filename: String,
    pub size_bytes: u64,
    /// Inferred from the filename extension when absent.
    #[serde(default)]
    pub mime_kind: Option<MimeKind>,
    #[serde(default)]
    pub metadata: ArtifactMetadata,
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, Artifact>,
    order: Vec<Uuid>,
}

pub struct ArtifactStore {
    max_bytes: u64,
    inner: RwLock<Inner>,
}

impl ArtifactStore {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes, inner: RwLock::new(Inner::default()) }
    }

    /// Validate and record a new artifact.
    pub async fn register(&self, reg: ArtifactRegistration) -> Result<Artifact> {
        let filename = reg.filename.trim();
        if filename.is_empty() {
            return Err(OceanyxError::InvalidInput("filename is empty".to_string()));
        }
        if reg.size_bytes == 0 {
            return Err(OceanyxError::InvalidInput(format!("{filename} is empty")));
        }
        if reg.size_bytes > self.max_bytes {
            return Err(OceanyxError::InvalidInput(format!(
                "{filename} is {} bytes, limit is {}",
                reg.size_bytes, self.max_bytes
            )));
        }
        let mime_kind = match reg.mime_kind {
            Some(kind) => kind,
            None => MimeKind::from_filename(filename).ok_or_else(|| {
                OceanyxError::InvalidInput(format!("unsupported file type: {filename}"))
            })?,
        };
        reg.metadata.validate()?;

        let artifact = Artifact {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            size_bytes: reg.size_bytes,
            mime_kind,
            uploaded_at: Utc::now(),
            metadata: reg.metadata,
        };

        let mut inner = self.inner.write().await;
        inner.order.push(artifact.id);
        inner.by_id.insert(artifact.id, artifact.clone());
        info!(
            artifact_id = %artifact.id,
            filename = %artifact.filename,
            kind = artifact.mime_kind.as_str(),
            size_bytes = artifact.size_bytes,
            "Artifact registered"
        );
        Ok(artifact)
    }

    /// Insert an artifact created elsewhere, keeping its id.
    pub async fn insert(&self, artifact: Artifact) {
        let mut inner = self.inner.write().await;
        if inner.by_id.insert(artifact.id, artifact.clone()).is_none() {
            inner.order.push(artifact.id);
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Artifact> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| OceanyxError::artifact_not_found(id))
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.inner.read().await.by_id.contains_key(&id)
    }

    /// All artifacts, oldest first.
    pub async fn list(&self) -> Vec<Artifact> {
        let inner = self.inner.read().await;
        inner.order.iter().filter_map(|id| inner.by_id.get(id).cloned()).collect()
    }
}
