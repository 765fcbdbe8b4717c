//! Reverse Geocoding
//!
//! Nominatim lookup used to decorate alerts and incident reports with a
//! human-readable place name. Infallible at the call site: any failure
//! falls back to the stringified coordinate pair.

use serde::Deserialize;
use threat_engine::GeoPoint;
use tracing::debug;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

#[derive(Deserialize)]
struct NominatimResponse {
    display_name: String,
}

pub struct ReverseGeocoder {
    client: reqwest::Client,
}

impl ReverseGeocoder {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!("toursafe-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Display name for a point, or `"lat, lng"` when the lookup fails.
    pub async fn display_name(&self, point: GeoPoint) -> String {
        match self.lookup(point).await {
            Ok(name) => name,
            Err(e) => {
                debug!(error = %e, %point, "reverse geocode failed, using coordinates");
                point.to_string()
            }
        }
    }

    async fn lookup(&self, point: GeoPoint) -> Result<String, reqwest::Error> {
        let url = format!(
            "{NOMINATIM_URL}?lat={:.6}&lon={:.6}&format=jsonv2&zoom=12",
            point.lat, point.lng
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let data: NominatimResponse = response.json().await?;
        Ok(data.display_name)
    }
}

impl Default for ReverseGeocoder {
    fn default() -> Self {
        Self::new()
    }
}
