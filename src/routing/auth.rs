//! Outbound authentication
//!
//! Security alternatives are tried in order and the first scheme that the
//! credentials can satisfy is applied. When nothing is satisfied, including
//! operations that declare no security, the legacy channels are used.

use crate::config::Credentials;
use crate::error::{BridgeError, Result};
use crate::registry::types::{ApiKeyLocation, SecurityRequirement, SecurityScheme};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Mutable pieces of the request while it is being assembled
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub url: Url,
    pub headers: HeaderMap,
    /// `name=value` pairs, joined into one `Cookie` header at the end
    pub cookies: Vec<String>,
}

impl RequestParts {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
            cookies: Vec::new(),
        }
    }

    /// Set (replace) a header
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| BridgeError::request_build(format!("Invalid header name: {}", name)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| BridgeError::request_build(format!("Invalid value for header {}", name)))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Set (replace) a header carrying a credential. The value is marked
    /// sensitive and never echoed in the error.
    pub fn set_credential_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| BridgeError::auth(format!("Invalid credential header name: {}", name)))?;
        let mut header_value = HeaderValue::from_str(value)
            .map_err(|_| BridgeError::auth(format!("Credential for header {} is not a valid header value", name)))?;
        header_value.set_sensitive(true);
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Set (replace) a query parameter, keeping all other pairs
    pub fn set_query(&mut self, name: &str, value: &str) {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != name)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        self.url
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(name, value);
    }

    pub fn add_cookie(&mut self, name: &str, value: &str) {
        self.cookies.push(format!("{}={}", name, value));
    }

    /// Fold the collected cookies into the `Cookie` header
    pub fn finish(mut self) -> Result<(Url, HeaderMap)> {
        if !self.cookies.is_empty() {
            let joined = self.cookies.join("; ");
            let value = HeaderValue::from_str(&joined)
                .map_err(|_| BridgeError::request_build("Invalid cookie value"))?;
            self.headers.insert(COOKIE, value);
        }
        Ok((self.url, self.headers))
    }
}

/// Apply credentials for an operation's security alternatives.
///
/// Returns `true` when a declared scheme was satisfied; otherwise the legacy
/// fallback has been applied.
pub fn apply_authentication(
    parts: &mut RequestParts,
    security: &[SecurityRequirement],
    schemes: &HashMap<String, SecurityScheme>,
    credentials: &Credentials,
) -> Result<bool> {
    for alternative in security {
        for scheme_name in alternative.keys() {
            let Some(scheme) = schemes.get(scheme_name) else {
                warn!("Security scheme '{}' is not declared by the document", scheme_name);
                continue;
            };
            if satisfy_scheme(parts, scheme, credentials)? {
                debug!("Authenticated with security scheme '{}'", scheme_name);
                return Ok(true);
            }
        }
    }

    apply_legacy_credentials(parts, credentials)?;
    Ok(false)
}

fn satisfy_scheme(parts: &mut RequestParts, scheme: &SecurityScheme, credentials: &Credentials) -> Result<bool> {
    match scheme {
        SecurityScheme::Http { scheme } if scheme.eq_ignore_ascii_case("bearer") => {
            set_authorization(parts, credentials.bearer_authorization())
        }
        SecurityScheme::Http { scheme } if scheme.eq_ignore_ascii_case("basic") => {
            set_authorization(parts, credentials.basic_authorization())
        }
        SecurityScheme::Http { scheme } => {
            debug!("Unsupported HTTP auth scheme '{}'", scheme);
            Ok(false)
        }
        SecurityScheme::OAuth2 { .. } => set_authorization(parts, credentials.bearer_authorization()),
        SecurityScheme::ApiKey { name, location } => {
            let Some(key) = credentials.api_key().filter(|_| !name.is_empty()) else {
                return Ok(false);
            };
            match location {
                ApiKeyLocation::Header => parts.set_credential_header(name, key)?,
                ApiKeyLocation::Query => parts.set_query(name, key),
                ApiKeyLocation::Cookie => parts.add_cookie(name, key),
            }
            Ok(true)
        }
        SecurityScheme::OpenIdConnect { .. } => Ok(false),
    }
}

fn set_authorization(parts: &mut RequestParts, value: Option<String>) -> Result<bool> {
    match value {
        Some(value) => {
            parts.set_credential_header(AUTHORIZATION.as_str(), &value)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// API key into the configured header (only when a header name is known),
/// then bearer, else basic, into `Authorization`
fn apply_legacy_credentials(parts: &mut RequestParts, credentials: &Credentials) -> Result<()> {
    if let (Some(key), Some(header)) = (credentials.api_key(), credentials.api_key_header.as_deref()) {
        parts.set_credential_header(header, key)?;
    }

    if let Some(bearer) = credentials.bearer_authorization() {
        parts.set_credential_header(AUTHORIZATION.as_str(), &bearer)?;
    } else if let Some(basic) = credentials.basic_authorization() {
        parts.set_credential_header(AUTHORIZATION.as_str(), &basic)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> RequestParts {
        RequestParts::new(Url::parse("https://api.example.com/pets?limit=5").unwrap())
    }

    fn requirement(names: &[&str]) -> SecurityRequirement {
        names.iter().map(|n| (n.to_string(), Vec::new())).collect()
    }

    fn schemes() -> HashMap<String, SecurityScheme> {
        let mut schemes = HashMap::new();
        schemes.insert("bearerAuth".to_string(), SecurityScheme::bearer());
        schemes.insert("basicAuth".to_string(), SecurityScheme::basic());
        schemes.insert("headerKey".to_string(), SecurityScheme::api_key("X-Key", ApiKeyLocation::Header));
        schemes.insert("queryKey".to_string(), SecurityScheme::api_key("api_key", ApiKeyLocation::Query));
        schemes.insert("cookieKey".to_string(), SecurityScheme::api_key("sid", ApiKeyLocation::Cookie));
        schemes.insert("oauth".to_string(), SecurityScheme::OAuth2 { flows: None });
        schemes
    }

    #[test]
    fn test_api_key_header_scheme_skips_fallback() {
        let mut p = parts();
        let creds = Credentials::new().with_api_key("secret").with_bearer_token("tok");

        let satisfied = apply_authentication(&mut p, &[requirement(&["headerKey"])], &schemes(), &creds).unwrap();
        assert!(satisfied);
        assert_eq!(p.headers.get("X-Key").unwrap(), "secret");
        assert!(p.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_unsatisfied_alternative_falls_through_to_next() {
        let mut p = parts();
        let creds = Credentials::new().with_basic_auth("user:pass");
        let security = vec![requirement(&["bearerAuth"]), requirement(&["basicAuth"])];

        assert!(apply_authentication(&mut p, &security, &schemes(), &creds).unwrap());
        assert_eq!(p.headers.get(AUTHORIZATION).unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_query_and_cookie_api_keys() {
        let creds = Credentials::new().with_api_key("k");

        let mut p = parts();
        apply_authentication(&mut p, &[requirement(&["queryKey"])], &schemes(), &creds).unwrap();
        assert_eq!(p.url.query(), Some("limit=5&api_key=k"));

        let mut p = parts();
        p.add_cookie("theme", "dark");
        apply_authentication(&mut p, &[requirement(&["cookieKey"])], &schemes(), &creds).unwrap();
        let (_, headers) = p.finish().unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "theme=dark; sid=k");
    }

    #[test]
    fn test_oauth2_uses_bearer() {
        let mut p = parts();
        let creds = Credentials::new().with_bearer_token("tok");
        assert!(apply_authentication(&mut p, &[requirement(&["oauth"])], &schemes(), &creds).unwrap());
        assert_eq!(p.headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn test_legacy_fallback_without_security() {
        let mut p = parts();
        let creds = Credentials::new()
            .with_api_key("k")
            .with_bearer_token("tok")
            .with_basic_auth("user:pass");
        assert!(!apply_authentication(&mut p, &[], &schemes(), &creds).unwrap());
        assert_eq!(p.headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
        assert_eq!(p.headers.len(), 1);

        let mut p = parts();
        let creds = Credentials::new().with_api_key("k").with_api_key_header("X-Api-Key");
        apply_authentication(&mut p, &[], &schemes(), &creds).unwrap();
        assert_eq!(p.headers.get("x-api-key").unwrap(), "k");
    }

    #[test]
    fn test_unencodable_credential_is_an_auth_error() {
        let mut p = parts();
        let creds = Credentials::new().with_bearer_token("line\nbreak");

        let err = apply_authentication(&mut p, &[requirement(&["bearerAuth"])], &schemes(), &creds).unwrap_err();
        assert_eq!(err.category(), "auth");
        assert!(!err.to_string().contains("line"));
        assert!(p.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_credential_headers_are_sensitive() {
        let mut p = parts();
        let creds = Credentials::new().with_api_key("secret");
        apply_authentication(&mut p, &[requirement(&["headerKey"])], &schemes(), &creds).unwrap();
        assert!(p.headers.get("X-Key").unwrap().is_sensitive());
    }
}
