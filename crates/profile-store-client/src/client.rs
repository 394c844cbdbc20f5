//! REST API client for the `profiles` table.

use crate::error::{StoreError, StoreResult};
use crate::types::{Profile, ProfilePatch};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// REST API client for profile rows.
#[derive(Clone)]
pub struct ProfileStoreClient {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
}

impl std::fmt::Debug for ProfileStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStoreClient")
            .field("api_url", &self.api_url)
            .field("publishable_key", &"***")
            .finish()
    }
}

impl ProfileStoreClient {
    /// Create a new profile store client.
    ///
    /// # Arguments
    /// * `api_url` - The project API URL (e.g., `https://xyz.supabase.co`)
    /// * `publishable_key` - The publishable API key
    pub fn new(api_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.into(),
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    /// Fetch a profile row by identity id.
    ///
    /// Returns `Ok(None)` when no row exists for that id.
    pub async fn get_profile_by_id(
        &self,
        id: &str,
        access_token: &str,
    ) -> StoreResult<Option<Profile>> {
        let url = format!("{}?id=eq.{}&limit=1", self.rest_url("profiles"), id);

        debug!(id = %id, "Fetching profile");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Store {
                status,
                summary: summarize_response_body(&body),
            });
        }

        let rows: Vec<Profile> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a new profile row, returning the stored record.
    pub async fn insert_profile(
        &self,
        record: &Profile,
        access_token: &str,
    ) -> StoreResult<Profile> {
        let url = self.rest_url("profiles");

        debug!(id = %record.id, "Inserting profile");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Store {
                status,
                summary: summarize_response_body(&body),
            });
        }

        // return=representation yields an array with the inserted row
        let mut rows: Vec<Profile> = response.json().await?;
        rows.pop().ok_or_else(|| StoreError::Store {
            status: 200,
            summary: "insert returned no representation".to_string(),
        })
    }

    /// Apply a partial update to an existing profile row.
    ///
    /// Fields not set in the patch are left untouched. An empty patch is a
    /// no-op and skips the network call.
    pub async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
        access_token: &str,
    ) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let url = format!("{}?id=eq.{}", self.rest_url("profiles"), id);

        debug!(id = %id, "Updating profile");

        let response = self
            .http_client
            .patch(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Store {
                status,
                summary: summarize_response_body(&body),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ProfileStoreClient::new("https://test.supabase.co/", "test-key");
        assert_eq!(client.api_url, "https://test.supabase.co");
        assert_eq!(client.publishable_key, "test-key");
    }

    #[test]
    fn test_rest_url() {
        let client = ProfileStoreClient::new("https://test.supabase.co", "test-key");
        assert_eq!(
            client.rest_url("profiles"),
            "https://test.supabase.co/rest/v1/profiles"
        );
    }

    #[test]
    fn debug_masks_key() {
        let client = ProfileStoreClient::new("https://test.supabase.co", "secret-key");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key"));
    }

    #[tokio::test]
    async fn empty_patch_skips_network() {
        // Unroutable URL: would fail if a request were attempted.
        let client = ProfileStoreClient::new("http://127.0.0.1:1", "test-key");
        let result = client
            .update_profile("u1", &ProfilePatch::default(), "token")
            .await;
        assert!(result.is_ok());
    }
}
