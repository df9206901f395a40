//! Per-request hooks: the skip predicate and the credential validator.

use std::collections::HashSet;

use axum::extract::{MatchedPath, Request};
use axum::http::Method;

use crate::jwt::VerifiedToken;

/// What the hooks get to see of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    /// Request path as received.
    pub path: String,
    /// Route template the request matched (e.g. `/admin/{id}`), when the gate
    /// runs inside a router.
    pub matched_path: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            matched_path: None,
        }
    }

    pub fn from_request(req: &Request) -> Self {
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            matched_path: req
                .extensions()
                .get::<MatchedPath>()
                .map(|m| m.as_str().to_string()),
        }
    }
}

/// Decides whether a request bypasses verification entirely.
///
/// Closures of type `Fn(&RequestContext) -> bool` implement this trait.
pub trait Skipper: Send + Sync {
    fn skip(&self, ctx: &RequestContext) -> bool;
}

impl<F> Skipper for F
where
    F: Fn(&RequestContext) -> bool + Send + Sync,
{
    fn skip(&self, ctx: &RequestContext) -> bool {
        self(ctx)
    }
}

/// Verifies every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSkip;

impl Skipper for NeverSkip {
    fn skip(&self, _ctx: &RequestContext) -> bool {
        false
    }
}

/// Skips requests whose path, or matched route, is in a fixed set.
#[derive(Debug, Clone, Default)]
pub struct PathSkipper {
    paths: HashSet<String>,
}

impl PathSkipper {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Skipper for PathSkipper {
    fn skip(&self, ctx: &RequestContext) -> bool {
        self.paths.contains(&ctx.path)
            || ctx
                .matched_path
                .as_ref()
                .is_some_and(|m| self.paths.contains(m))
    }
}

/// Extra check run on a fully verified token. `Err` carries the reason
/// reported to the client.
///
/// Closures of type `Fn(&VerifiedToken, &RequestContext) -> Result<(), String>`
/// implement this trait.
pub trait CredentialValidator: Send + Sync {
    fn validate(&self, token: &VerifiedToken, ctx: &RequestContext) -> Result<(), String>;
}

impl<F> CredentialValidator for F
where
    F: Fn(&VerifiedToken, &RequestContext) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, token: &VerifiedToken, ctx: &RequestContext) -> Result<(), String> {
        self(token, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_skip() {
        assert!(!NeverSkip.skip(&RequestContext::new(Method::GET, "/health")));
    }

    #[test]
    fn path_skipper_matches_exact_paths() {
        let skipper = PathSkipper::new(["/admin/ping"]);
        assert!(skipper.skip(&RequestContext::new(Method::GET, "/admin/ping")));
        assert!(!skipper.skip(&RequestContext::new(Method::GET, "/admin/ping/")));
        assert!(!skipper.skip(&RequestContext::new(Method::GET, "/admin/")));
    }

    #[test]
    fn path_skipper_matches_route_templates() {
        let skipper = PathSkipper::new(["/admin/items/{id}"]);
        let mut ctx = RequestContext::new(Method::GET, "/admin/items/7");
        assert!(!skipper.skip(&ctx));
        ctx.matched_path = Some("/admin/items/{id}".into());
        assert!(skipper.skip(&ctx));
    }

    #[test]
    fn closures_are_skippers() {
        let skip_options = |ctx: &RequestContext| ctx.method == Method::OPTIONS;
        assert!(skip_options.skip(&RequestContext::new(Method::OPTIONS, "/admin/")));
        assert!(!skip_options.skip(&RequestContext::new(Method::GET, "/admin/")));
    }
}
