//! Best-effort IP geolocation against free providers.
//!
//! Lookups happen off the request path after a visit row is inserted, so a
//! slow or dead provider only loses the country/city columns.

use std::net::IpAddr;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

/// Resolved location for a visitor IP. Both fields are best-effort.
#[derive(Debug, Clone, Default)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub city: Option<String>,
}

const PROVIDERS: [&str; 2] = ["https://ipapi.co/{ip}/json/", "http://ip-api.com/json/{ip}"];

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Queries each provider in order; the first answer carrying a country wins.
/// Local and private addresses are never sent out.
pub async fn lookup(ip: &str) -> GeoLocation {
    if is_local_ip(ip) {
        return GeoLocation::default();
    }

    let client = match reqwest::Client::builder().timeout(PROVIDER_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            debug!("Geo client build failed: {}", e);
            return GeoLocation::default();
        }
    };

    for provider in PROVIDERS {
        let url = provider.replace("{ip}", ip);
        match query_provider(&client, &url).await {
            Ok(location) if location.country.is_some() => return location,
            Ok(_) => {}
            Err(e) => debug!("Geo provider {} failed: {}", url, e),
        }
    }

    GeoLocation::default()
}

async fn query_provider(client: &reqwest::Client, url: &str) -> anyhow::Result<GeoLocation> {
    let data: Value = client.get(url).send().await?.error_for_status()?.json().await?;
    Ok(normalize(&data, url))
}

/// Providers disagree on field names; map each to country/city.
fn normalize(data: &Value, url: &str) -> GeoLocation {
    let country_key = if url.contains("ipapi.co") { "country_name" } else { "country" };
    GeoLocation {
        country: data.get(country_key).and_then(Value::as_str).map(str::to_string),
        city: data.get("city").and_then(Value::as_str).map(str::to_string),
    }
}

fn is_local_ip(ip: &str) -> bool {
    if ip.is_empty() {
        return true;
    }
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        Ok(IpAddr::V6(v6)) => v6.is_loopback() || v6.is_unspecified(),
        // Unparseable input never leaves the machine.
        Err(_) => true,
    }
}
