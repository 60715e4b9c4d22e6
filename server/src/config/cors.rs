use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

/// Events are never deleted through the API, so only the read and write
/// verbs the event resources answer to are allowed.
pub fn create_cors_layer(allowed_origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::LOCATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    match parse_origins(allowed_origins) {
        Some(origins) => layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true),
        // Credentials cannot be combined with a wildcard origin.
        None => layer.allow_origin(AllowOrigin::any()),
    }
}

fn parse_origins(origins_str: &str) -> Option<Vec<HeaderValue>> {
    let origins: Vec<HeaderValue> = origins_str
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, allowing any origin");
        None
    } else {
        tracing::info!("CORS: Configured with {} allowed origin(s)", origins.len());
        Some(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ALLOWED_ORIGINS;

    #[test]
    fn test_default_origins_are_valid() {
        let origins = parse_origins(DEFAULT_ALLOWED_ORIGINS).unwrap();
        assert_eq!(origins.len(), 2);
    }

    #[test]
    fn test_blank_entries_are_skipped() {
        let origins = parse_origins(" http://a.example , ,http://b.example").unwrap();
        assert_eq!(origins[0], "http://a.example");
        assert_eq!(origins[1], "http://b.example");
    }

    #[test]
    fn test_no_origins_falls_back_to_any() {
        assert!(parse_origins(" , ").is_none());
        let _layer = create_cors_layer("");
    }
}
