mod app;
mod keys;
mod mock;
mod token;

pub use app::{resolve_path, TestApp, TestRequest, TestResponse, ACCESS_TOKEN_HEADER};
pub use keys::{jwks_json, TestKeyPair, DEFAULT_KID, OTHER_KID};
pub use mock::MockJwks;
pub use token::{cognito_issuer, tamper_claims, TokenBuilder, TEST_POOL_ID, TEST_REGION};
