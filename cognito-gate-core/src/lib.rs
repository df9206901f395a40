pub mod config;
pub mod error;
pub mod layers;
pub mod response;

pub use config::{AppConfig, ConfigError, ConfigValue, FromConfigValue};
pub use error::HttpError;
pub use layers::{default_cors, default_trace, init_tracing};
pub use response::ApiResponse;

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{ApiResponse, AppConfig, ConfigError, HttpError};
}
