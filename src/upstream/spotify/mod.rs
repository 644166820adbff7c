mod client;
mod config;
mod models;

pub use self::client::SpotifyClient;
pub use self::config::{MissingEnvVar, SpotifyConfig};
