// src/utils/env.rs
use log::{debug, warn};

/// Loads a `.env` file into the process environment if one is present.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(dotenv::Error::Io(_)) => debug!("No .env file found; using process environment"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}
