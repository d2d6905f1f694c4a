//! Path templates of the beer service.
//!
//! Templates carry a single `{...}` placeholder which is filled by the
//! functions below. Values are percent-encoded so that they always land in
//! exactly one path segment.

use uuid::Uuid;

/// Origin used when no base url is configured.
pub const DEFAULT_BASE_URL: &str = "http://api.springframework.guru";

/// Collection path, used to list and create beers.
pub const BEER_V1_PATH: &str = "/api/v1/beer";
/// Single beer addressed by its service-assigned id.
pub const BEER_V1_BY_ID: &str = "/api/v1/beer/{beer_id}";
/// Single beer addressed by its universal product code.
pub const BEER_V1_UPC_PATH: &str = "/api/v1/beerUpc/{upc}";

const BEER_ID_PLACEHOLDER: &str = "{beer_id}";
const UPC_PLACEHOLDER: &str = "{upc}";

/// Path of the beer with the given id.
pub fn beer_by_id_path(beer_id: Uuid) -> String {
    fill(BEER_V1_BY_ID, BEER_ID_PLACEHOLDER, &beer_id.to_string())
}

/// Path of the beer with the given product code.
pub fn beer_by_upc_path(upc: &str) -> String {
    fill(BEER_V1_UPC_PATH, UPC_PLACEHOLDER, upc)
}

fn fill(template: &str, placeholder: &str, value: &str) -> String {
    template.replacen(placeholder, &url_escape::encode_component(value), 1)
}

/// Join the configured origin and an endpoint path.
///
/// The origin is kept as a raw string, a trailing slash is dropped so
/// `http://host/` and `http://host` produce the same url.
pub(crate) fn url_for(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fills_beer_id() {
        let beer_id = Uuid::parse_str("0a818933-087d-47f2-ad83-2f986ed087eb").unwrap();
        assert_eq!(
            beer_by_id_path(beer_id),
            "/api/v1/beer/0a818933-087d-47f2-ad83-2f986ed087eb"
        );
    }

    #[test]
    fn fills_upc() {
        assert_eq!(beer_by_upc_path("0631234200036"), "/api/v1/beerUpc/0631234200036");
    }

    #[test]
    fn upc_stays_in_one_segment() {
        let path = beer_by_upc_path("06/31 23");
        assert!(path.starts_with("/api/v1/beerUpc/"));
        assert!(!path["/api/v1/beerUpc/".len()..].contains('/'));
        assert!(!path.contains(' '));
    }

    #[test]
    fn joins_base_url_with_and_without_trailing_slash() {
        assert_eq!(
            url_for("http://localhost:8080/", BEER_V1_PATH),
            "http://localhost:8080/api/v1/beer"
        );
        assert_eq!(
            url_for("http://localhost:8080", BEER_V1_PATH),
            "http://localhost:8080/api/v1/beer"
        );
    }
}
