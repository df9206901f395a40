use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tracing::debug;

use crate::error::GateError;

/// Strip the `Bearer` scheme from an `Authorization` header value.
pub fn extract_bearer_token(header_value: &str) -> Result<&str, GateError> {
    let parts: Vec<&str> = header_value.splitn(2, ' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("Bearer") {
        return Err(GateError::MalformedToken(
            "expected 'Bearer <token>' authorization".into(),
        ));
    }
    Ok(parts[1].trim())
}

/// Read the raw token from `header_name`.
///
/// An absent, empty or non-UTF-8 header is [`GateError::MissingToken`]. The
/// `authorization` header additionally has its `Bearer` scheme stripped.
pub fn extract_token<'a>(headers: &'a HeaderMap, header_name: &str) -> Result<&'a str, GateError> {
    let value = headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            debug!(header = %header_name, "No token in request");
            GateError::MissingToken
        })?;

    if header_name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
        let token = extract_bearer_token(value)?;
        if token.is_empty() {
            return Err(GateError::MissingToken);
        }
        Ok(token)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_custom_header() {
        let mut headers = HeaderMap::new();
        headers.insert("access_token", HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(extract_token(&headers, "access_token"), Ok("abc.def.ghi"));
    }

    #[test]
    fn missing_or_empty_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_token(&headers, "access_token"),
            Err(GateError::MissingToken)
        );
        headers.insert("access_token", HeaderValue::from_static(""));
        assert_eq!(
            extract_token(&headers, "access_token"),
            Err(GateError::MissingToken)
        );
    }

    #[test]
    fn non_utf8_header_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "access_token",
            HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap(),
        );
        assert_eq!(
            extract_token(&headers, "access_token"),
            Err(GateError::MissingToken)
        );
    }

    #[test]
    fn authorization_header_strips_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer a.b.c"));
        assert_eq!(extract_token(&headers, "authorization"), Ok("a.b.c"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(matches!(
            extract_token(&headers, "authorization"),
            Err(GateError::MalformedToken(_))
        ));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token("BEARER tok"), Ok("tok"));
        assert!(extract_bearer_token("tok").is_err());
    }
}
