//! Postal-code lookup against the public zipcloud API. Lookups degrade
//! silently: any network or decode failure is logged and yields `None`,
//! leaving the caller's address field untouched.

use serde::Deserialize;

const ZIPCLOUD_URL: &str = "https://zipcloud.ibsnet.co.jp/api/search";

pub struct AddressClient {
    client: reqwest::Client,
    base_url: String,
}

impl AddressClient {
    pub fn new() -> Self {
        AddressClient {
            client: reqwest::Client::new(),
            base_url: ZIPCLOUD_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint; used by tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        AddressClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Resolve a 7-digit Japanese postal code (hyphens allowed) to a
    /// single concatenated address string.
    pub async fn lookup(&self, zip: &str) -> Option<String> {
        let clean = normalize_zip(zip)?;
        match self.fetch(&clean).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(zip = %clean, error = %e, "zip lookup failed");
                None
            }
        }
    }

    async fn fetch(&self, zip: &str) -> reqwest::Result<Option<String>> {
        let url = format!("{}?zipcode={}", self.base_url, zip);
        let response = self.client.get(&url).send().await?;
        let body: ZipcloudResponse = response.json().await?;
        Ok(resolve_address(body))
    }
}

impl Default for AddressClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ZipcloudResponse {
    status: i32,
    results: Option<Vec<ZipcloudEntry>>,
}

#[derive(Debug, Deserialize)]
struct ZipcloudEntry {
    address1: String,
    address2: String,
    address3: String,
}

/// Strip hyphens and insist on exactly seven characters, the shape the
/// API accepts.
fn normalize_zip(zip: &str) -> Option<String> {
    let clean: String = zip.chars().filter(|c| *c != '-').collect();
    if clean.chars().count() == 7 {
        Some(clean)
    } else {
        None
    }
}

fn resolve_address(body: ZipcloudResponse) -> Option<String> {
    if body.status != 200 {
        return None;
    }
    let entry = body.results?.into_iter().next()?;
    Some(format!(
        "{}{}{}",
        entry.address1, entry.address2, entry.address3
    ))
}
