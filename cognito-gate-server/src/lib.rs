pub mod routes;
pub mod settings;

pub use routes::router;
pub use settings::Settings;
