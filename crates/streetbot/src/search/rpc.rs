//! Supabase REST client for the `search_services_by_location` function.
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use streetbot_gazetteer::Coordinates;
use tracing::{debug, instrument};

use super::{NearestNeighborQuery, QueryError, ServiceRecord};

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
/// Checked when [`SUPABASE_URL_ENV`] is unset.
pub const SUPABASE_PUBLIC_URL_ENV: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

const RPC_FUNCTION: &str = "search_services_by_location";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SearchParams {
    user_lat: f64,
    user_lng: f64,
    radius_meters: u32,
    max_results: u32,
}

/// Calls the database-side nearest-neighbor search over PostgREST.
#[derive(Debug, Clone)]
pub struct SupabaseRpcClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SupabaseRpcClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, QueryError> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(QueryError::NotConfigured("empty Supabase URL".into()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{base_url}/rest/v1/rpc/{RPC_FUNCTION}"),
            api_key: api_key.into(),
        })
    }

    /// Client configured from `SUPABASE_URL` (or `NEXT_PUBLIC_SUPABASE_URL`) and
    /// `SUPABASE_ANON_KEY`.
    pub fn from_env() -> Result<Self, QueryError> {
        let url = std::env::var(SUPABASE_URL_ENV)
            .or_else(|_| std::env::var(SUPABASE_PUBLIC_URL_ENV))
            .map_err(|_| QueryError::NotConfigured(format!("{SUPABASE_URL_ENV} is not set")))?;
        let key = std::env::var(SUPABASE_ANON_KEY_ENV).map_err(|_| {
            QueryError::NotConfigured(format!("{SUPABASE_ANON_KEY_ENV} is not set"))
        })?;
        Self::new(&url, key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NearestNeighborQuery for SupabaseRpcClient {
    #[instrument(name = "Supabase service search", level = "debug", skip(self))]
    async fn query(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        max_results: u32,
    ) -> Result<Vec<ServiceRecord>, QueryError> {
        let params = SearchParams {
            user_lat: coordinates.lat,
            user_lng: coordinates.lng,
            radius_meters,
            max_results,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Rpc {
                status: status.as_u16(),
                message: body,
            });
        }

        let records: Vec<ServiceRecord> = resp.json().await?;
        debug!(found = records.len(), "Supabase search returned");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_base_url() {
        let client = SupabaseRpcClient::new("https://abc.supabase.co/", "anon").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://abc.supabase.co/rest/v1/rpc/search_services_by_location"
        );
    }

    #[test]
    fn test_empty_url_is_rejected() {
        assert!(matches!(
            SupabaseRpcClient::new("  ", "anon"),
            Err(QueryError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_params_json_shape() {
        let params = SearchParams {
            user_lat: 43.6373,
            user_lng: -79.5362,
            radius_meters: 5000,
            max_results: 20,
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({
                "user_lat": 43.6373,
                "user_lng": -79.5362,
                "radius_meters": 5000,
                "max_results": 20,
            })
        );
    }

    #[test]
    fn test_rows_with_missing_fields_deserialize() {
        let rows: Vec<ServiceRecord> = serde_json::from_str(
            r#"[{"id": "a1", "title": "Drop-in", "category": "Shelter", "distance_km": 0.8, "phone": null}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].title, "Drop-in");
        assert_eq!(rows[0].distance_km(), Some(0.8));
        assert_eq!(rows[0].phone, None);
    }

    #[test]
    fn test_distances_sent_as_text_deserialize() {
        let rows: Vec<ServiceRecord> = serde_json::from_str(
            r#"[
                {"id": "a1", "title": "Drop-in", "category": "Shelter", "distance_km": "0.8", "distance_meters": 800},
                {"id": "a2", "title": "Food Bank", "category": "Food", "distance_km": "1.25 km"},
                {"id": "a3", "title": "Clinic", "category": "Health", "distance_km": "", "distance_meters": "2500"}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].distance_km, Some(0.8));
        assert_eq!(rows[0].distance_meters, Some(800.0));
        assert_eq!(rows[1].distance_km(), Some(1.25));
        assert_eq!(rows[2].distance_km, None);
        assert_eq!(rows[2].distance_km(), Some(2.5));
    }
}
