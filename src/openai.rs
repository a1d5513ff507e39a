//! OpenAI client configuration with sensible defaults.

use crate::config::ApiSettings;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from API settings, if a key is configured.
///
/// Uses a request timeout (default 5 minutes) to prevent hung API calls.
pub fn create_client(api: &ApiSettings) -> Option<Client<OpenAIConfig>> {
    let api_key = api.resolve_api_key()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base_url) = &api.base_url {
        config = config.with_api_base(base_url.trim_end_matches('/'));
    }

    Some(with_timeout(config, Duration::from_secs(api.timeout_seconds)))
}

/// Create a client against the `/v1`-suffixed variant of the configured base
/// URL, for the single bounded retry after a generic remote failure.
///
/// Returns `None` when no custom base URL is configured or the URL already
/// ends in `/v1` (nothing different to try).
pub fn create_alternate_client(api: &ApiSettings) -> Option<Client<OpenAIConfig>> {
    let api_key = api.resolve_api_key()?;
    let base_url = api.base_url.as_deref()?.trim_end_matches('/').to_string();

    if base_url.ends_with("/v1") {
        return None;
    }

    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(format!("{}/v1", base_url));

    Some(with_timeout(config, Duration::from_secs(api.timeout_seconds)))
}

fn with_timeout(config: OpenAIConfig, timeout: Duration) -> Client<OpenAIConfig> {
    let client = Client::with_config(config);
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(http_client) => client.with_http_client(http_client),
        // Fall back to the SDK's default client rather than aborting.
        Err(_) => client,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: Option<&str>, key: Option<&str>) -> ApiSettings {
        ApiSettings {
            base_url: base_url.map(String::from),
            api_key: key.map(String::from),
            ..ApiSettings::default()
        }
    }

    #[test]
    fn test_no_key_no_client() {
        let settings = api(None, None);
        // Only meaningful when the env var is absent; skip otherwise.
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(create_client(&settings).is_none());
        }
    }

    #[test]
    fn test_alternate_requires_custom_base() {
        assert!(create_alternate_client(&api(None, Some("sk-test"))).is_none());
    }

    #[test]
    fn test_alternate_skips_v1_suffix() {
        let settings = api(Some("https://example.com/v1"), Some("sk-test"));
        assert!(create_alternate_client(&settings).is_none());

        let settings = api(Some("https://example.com/use/"), Some("sk-test"));
        assert!(create_alternate_client(&settings).is_some());
    }
}
