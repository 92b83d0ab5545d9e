//! ETR document extraction
//!
//! Extraction runs remotely; nothing is persisted by these calls.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::error::{HavonaMcpError, Result, ValidationError};
use crate::havona::client::HavonaClient;
use crate::havona::types::{DocumentType, ExtractionResult};

/// Document manager for Havona operations
pub struct DocumentManager<'a> {
    client: &'a HavonaClient,
}

impl<'a> DocumentManager<'a> {
    /// Create a new document manager
    pub fn new(client: &'a HavonaClient) -> Self {
        Self { client }
    }

    /// Document types supported for extraction
    pub async fn supported_types(&self) -> Result<Vec<DocumentType>> {
        let response = self.client.get("etr/document-types").await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(HavonaClient::request_failed(response, "Failed to list document types").await)
        }
    }

    /// Upload a local PDF and return the fields extracted from it
    pub async fn extract(&self, file_path: &Path, document_type: &str) -> Result<ExtractionResult> {
        if !file_path.is_file() {
            return Err(HavonaMcpError::Validation(ValidationError::FileNotFound {
                path: file_path.display().to_string(),
            }));
        }

        let data = tokio::fs::read(file_path).await?;
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        tracing::info!(
            document_type = %document_type,
            bytes = data.len(),
            "Submitting {} for extraction",
            filename
        );

        let response = self
            .client
            .post_with("etr/extract", |request| {
                let file = Part::bytes(data.clone()).file_name(filename.clone());
                let form = Form::new()
                    .text("documentType", document_type.to_string())
                    .part("file", file);
                request.multipart(form)
            })
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(HavonaClient::request_failed(response, "Document extraction failed").await)
        }
    }
}
