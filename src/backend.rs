use crate::seller::Seller;
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;

#[derive(Deserialize)]
struct SellerDocuments {
    documents: Vec<Seller>,
}

/// Client for the marketplace backend's document-query endpoint. One
/// best-effort fetch per session, no retry.
#[derive(Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_sellers(&self) -> Result<Vec<Seller>> {
        let url = format!("{}/api/sellers", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Seller fetch failed with status: {}",
                response.status()
            ));
        }

        let documents: SellerDocuments = response.json().await?;
        Ok(documents.documents)
    }
}
