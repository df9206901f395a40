use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

use crate::token::{cognito_issuer, TEST_POOL_ID, TEST_REGION};

/// A local stand-in for the Cognito JWKS endpoint.
///
/// Keys are served at `/<poolId>/.well-known/jwks.json`, mirroring the real
/// discovery path, so [`jwks_url`](Self::jwks_url) plugs straight into the
/// gate's JWKS URL override.
pub struct MockJwks {
    server: MockServer,
    region: String,
    pool_id: String,
}

impl MockJwks {
    /// Start a server for [`TEST_REGION`]/[`TEST_POOL_ID`] with nothing mounted.
    pub async fn start() -> Self {
        Self::start_for(TEST_REGION, TEST_POOL_ID).await
    }

    pub async fn start_for(region: &str, pool_id: &str) -> Self {
        Self {
            server: MockServer::start().await,
            region: region.to_string(),
            pool_id: pool_id.to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    /// The issuer tokens of this pool carry.
    pub fn issuer(&self) -> String {
        cognito_issuer(&self.region, &self.pool_id)
    }

    pub fn jwks_path(&self) -> String {
        format!("/{}/.well-known/jwks.json", self.pool_id)
    }

    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), self.jwks_path())
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    fn jwks_mock(&self) -> MockBuilder {
        Mock::given(method("GET")).and(path(self.jwks_path()))
    }

    /// Serve `jwks` for every request.
    pub async fn serve(&self, jwks: Value) {
        self.jwks_mock()
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&self.server)
            .await;
    }

    /// Serve `jwks` and verify on drop that it was fetched exactly `times` times.
    pub async fn serve_expecting(&self, jwks: Value, times: u64) {
        self.jwks_mock()
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Serve `jwks` for the next `times` requests only. Later mounts take
    /// over once it is used up.
    pub async fn serve_times(&self, jwks: Value, times: u64) {
        self.jwks_mock()
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Answer every request with `status` and a plain-text body.
    pub async fn fail_with(&self, status: u16) {
        self.jwks_mock()
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream error"))
            .mount(&self.server)
            .await;
    }

    /// Answer with a body that is not a JWKS document.
    pub async fn serve_garbage(&self) {
        self.jwks_mock()
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&self.server)
            .await;
    }

    /// Drop all mounted responses and recorded requests.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Number of JWKS requests received so far.
    pub async fn fetch_count(&self) -> usize {
        let jwks_path = self.jwks_path();
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == jwks_path)
            .count()
    }
}
