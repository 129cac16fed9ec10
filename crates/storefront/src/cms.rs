//! Sanity CMS client.
//!
//! Thin HTTP client over the Sanity data APIs: GROQ queries, the mutation
//! endpoint (`createIfNotExists` / `patch` / `delete`), and image asset
//! uploads. Product documents are keyed by a deterministic `_id` derived
//! from the vendor product ID so the sync handler can upsert without a
//! lookup round-trip.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use driftwood_core::catalog::{CmsContent, synthetic_document_id};
use driftwood_core::types::{CmsDocumentId, VendorProductId};

use crate::config::SanityConfig;

/// Errors that can occur when interacting with the CMS API.
#[derive(Debug, Error)]
pub enum CmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Image asset could not be fetched or stored.
    #[error("Asset error: {0}")]
    Asset(String),
}

/// The mutation surface the sync handler needs from the CMS.
///
/// Same seam pattern as the payment vendor port: [`CmsClient`] is the
/// production implementation, tests substitute a recording double.
#[async_trait]
pub trait CmsMirrorPort: Send + Sync {
    /// Create-if-absent, then overwrite vendor-owned fields.
    async fn upsert_product(&self, doc: &ProductUpsert) -> Result<(), CmsError>;

    /// Delete a product document.
    async fn delete_document(&self, id: &CmsDocumentId) -> Result<(), CmsError>;

    /// Re-store a vendor-hosted image as a CMS asset, returning its CDN URL.
    async fn upload_image_from_url(&self, source_url: &str) -> Result<String, CmsError>;
}

#[async_trait]
impl CmsMirrorPort for CmsClient {
    async fn upsert_product(&self, doc: &ProductUpsert) -> Result<(), CmsError> {
        CmsClient::upsert_product(self, doc).await
    }

    async fn delete_document(&self, id: &CmsDocumentId) -> Result<(), CmsError> {
        CmsClient::delete_document(self, id).await
    }

    async fn upload_image_from_url(&self, source_url: &str) -> Result<String, CmsError> {
        CmsClient::upload_image_from_url(self, source_url).await
    }
}

/// Client for the Sanity data and asset APIs.
#[derive(Clone)]
pub struct CmsClient {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    write_token: secrecy::SecretString,
}

impl CmsClient {
    /// Create a new CMS client.
    #[must_use]
    pub fn new(config: &SanityConfig) -> Self {
        let base_url = format!(
            "https://{}.api.sanity.io/v{}",
            config.project_id, config.api_version
        );
        Self {
            client: reqwest::Client::new(),
            base_url,
            dataset: config.dataset.clone(),
            write_token: config.write_token.clone(),
        }
    }

    /// Run a GROQ query and deserialize the `result` field.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not match
    /// the expected shape.
    pub async fn query<T: serde::de::DeserializeOwned>(&self, groq: &str) -> Result<T, CmsError> {
        let url = format!("{}/data/query/{}", self.base_url, self.dataset);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.write_token.expose_secret())
            .query(&[("query", groq)])
            .send()
            .await?;
        let envelope: QueryResponse<T> = Self::parse_response(response).await?;
        Ok(envelope.result)
    }

    /// Submit a batch of mutations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the batch.
    pub async fn mutate(&self, mutations: Vec<serde_json::Value>) -> Result<(), CmsError> {
        let url = format!("{}/data/mutate/{}", self.base_url, self.dataset);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.write_token.expose_secret())
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse_response(response).await?;
        Ok(())
    }

    /// All product documents in the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<CmsProductDoc>, CmsError> {
        self.query(
            "*[_type == \"product\"]{_id, _updatedAt, vendorProductId, name, \
             imageUrl, isFeatured, description}",
        )
        .await
    }

    /// Create the document if absent, then overwrite its vendor-owned fields.
    ///
    /// Editorial fields (rich description, featured flag) are set only on
    /// first creation and never patched afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation batch fails.
    #[instrument(skip(self, doc), fields(document_id = %doc.id))]
    pub async fn upsert_product(&self, doc: &ProductUpsert) -> Result<(), CmsError> {
        let create = json!({
            "createIfNotExists": {
                "_id": doc.id,
                "_type": "product",
                "vendorProductId": doc.vendor_product_id,
                "name": doc.name,
                "isFeatured": false,
            }
        });
        let mut fields = json!({
            "vendorProductId": doc.vendor_product_id,
            "name": doc.name,
            "variants": doc.variants,
        });
        if let Some(url) = &doc.image_url {
            fields["imageUrl"] = json!(url);
        }
        let patch = json!({
            "patch": {
                "id": doc.id,
                "set": fields,
            }
        });
        self.mutate(vec![create, patch]).await
    }

    /// Delete a product document.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn delete_document(&self, id: &CmsDocumentId) -> Result<(), CmsError> {
        self.mutate(vec![json!({ "delete": { "id": id } })]).await
    }

    /// Delete every product document in the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails.
    #[instrument(skip(self))]
    pub async fn delete_all_products(&self) -> Result<(), CmsError> {
        self.mutate(vec![json!({
            "delete": { "query": "*[_type == \"product\"]" }
        })])
        .await
    }

    /// Download an image from the vendor and re-store it as a CMS asset.
    ///
    /// Returns the CDN URL of the stored asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or upload fails.
    #[instrument(skip(self))]
    pub async fn upload_image_from_url(&self, source_url: &str) -> Result<String, CmsError> {
        let download = self.client.get(source_url).send().await?;
        if !download.status().is_success() {
            return Err(CmsError::Asset(format!(
                "image download failed with status {}",
                download.status()
            )));
        }
        let content_type = download
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = download.bytes().await?;

        let url = format!("{}/assets/images/{}", self.base_url, self.dataset);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.write_token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        let uploaded: AssetResponse = Self::parse_response(response).await?;
        Ok(uploaded.document.url)
    }

    /// Readiness probe: a trivial query against the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS is unreachable.
    pub async fn ping(&self) -> Result<(), CmsError> {
        let _: serde_json::Value = self.query("count(*[_type == \"product\"])").await?;
        Ok(())
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CmsError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CmsError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    url: String,
}

/// A product document as stored in the CMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsProductDoc {
    #[serde(rename = "_id")]
    pub id: CmsDocumentId,
    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub vendor_product_id: Option<VendorProductId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    /// Rich-text blocks. Kept opaque; only the block `_key`s are ever
    /// repaired server-side.
    #[serde(default)]
    pub description: Option<Vec<serde_json::Value>>,
}

impl CmsProductDoc {
    /// Plain-text rendering of the rich description, for the merge step.
    fn description_text(&self) -> Option<String> {
        let blocks = self.description.as_ref()?;
        let text: Vec<String> = blocks
            .iter()
            .filter_map(|block| {
                let children = block.get("children")?.as_array()?;
                let spans: Vec<&str> = children
                    .iter()
                    .filter_map(|child| child.get("text")?.as_str())
                    .collect();
                Some(spans.concat())
            })
            .filter(|line| !line.is_empty())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text.join("\n"))
        }
    }

    /// Convert into the editorial content record the catalog merge consumes.
    #[must_use]
    pub fn into_content(self) -> Option<CmsContent> {
        let vendor_id = self.vendor_product_id.clone()?;
        let description = self.description_text();
        Some(CmsContent {
            document_id: self.id.into_inner(),
            vendor_id,
            name: self.name,
            description,
            image_url: self.image_url,
            is_featured: self.is_featured,
        })
    }
}

/// Vendor-owned fields pushed to the CMS by the sync handler.
#[derive(Debug, Clone, Serialize)]
pub struct ProductUpsert {
    pub id: CmsDocumentId,
    pub vendor_product_id: VendorProductId,
    pub name: String,
    pub variants: Vec<VariantSnapshot>,
    pub image_url: Option<String>,
}

/// Cached variant data stored on the CMS document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSnapshot {
    #[serde(rename = "_key")]
    pub key: String,
    pub variant_id: String,
    pub nickname: String,
    pub unit_price_cents: i64,
    pub base_unit_multiplier: u32,
}

/// Deterministic CMS document ID for a vendor product.
#[must_use]
pub fn document_id_for(vendor_id: &VendorProductId) -> CmsDocumentId {
    CmsDocumentId::new(synthetic_document_id(vendor_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_deterministic() {
        let vendor_id = VendorProductId::new("prod_abc");
        assert_eq!(document_id_for(&vendor_id), document_id_for(&vendor_id));
        assert!(document_id_for(&vendor_id).as_str().starts_with("vendor-"));
    }

    #[test]
    fn test_doc_without_vendor_id_yields_no_content() {
        let doc = CmsProductDoc {
            id: CmsDocumentId::new("orphan"),
            updated_at: None,
            vendor_product_id: None,
            name: Some("Orphan".to_string()),
            image_url: None,
            is_featured: false,
            description: None,
        };
        assert!(doc.into_content().is_none());
    }

    #[test]
    fn test_description_text_flattens_blocks() {
        let doc = CmsProductDoc {
            id: CmsDocumentId::new("doc-1"),
            updated_at: None,
            vendor_product_id: Some(VendorProductId::new("prod_1")),
            name: Some("Roast".to_string()),
            image_url: None,
            is_featured: true,
            description: Some(vec![
                serde_json::json!({
                    "_type": "block",
                    "children": [
                        {"_type": "span", "text": "Bright and "},
                        {"_type": "span", "text": "juicy."}
                    ]
                }),
                serde_json::json!({
                    "_type": "block",
                    "children": [{"_type": "span", "text": "Washed process."}]
                }),
            ]),
        };
        let content = doc.into_content().expect("content");
        assert_eq!(
            content.description.as_deref(),
            Some("Bright and juicy.\nWashed process.")
        );
        assert!(content.is_featured);
    }
}
