pub mod claims;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod gate;
pub mod identity;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod skip;
pub mod token;

// Re-export primary public types for convenience.
pub use claims::{Claims, ClaimsValidator};
pub use config::VerificationConfig;
pub use error::GateError;
pub use extractor::{extract_bearer_token, extract_token};
pub use fetcher::KeySetFetcher;
pub use gate::{cognito_gate, CognitoGate};
pub use identity::CognitoUser;
pub use jwks::{CachePolicy, JwksCache};
pub use jwt::{TokenVerifier, VerifiedToken};
pub use keys::{decode_exponent, decode_modulus, KeyRecord, KeySet, RsaComponents};
pub use skip::{CredentialValidator, NeverSkip, PathSkipper, RequestContext, Skipper};
pub use token::{ParsedToken, TokenHeader};

// Algorithm names appear in the configuration surface.
pub use jsonwebtoken::Algorithm;

pub mod prelude {
    //! Re-exports of the most commonly used gate types.
    pub use crate::{
        CognitoGate, CognitoUser, GateError, PathSkipper, RequestContext, VerificationConfig,
        VerifiedToken,
    };
}
