pub mod analysis;
pub mod brief;
pub mod clients;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod prompts;
pub mod schemas;
pub mod sessions;
pub mod state;

/// Load `.env`, or the file named by MENTOR_ENV_FILE. Missing files are ignored.
pub fn load_env() {
    match std::env::var("MENTOR_ENV_FILE") {
        Ok(path) => {
            let _ = dotenvy::from_path(path);
        }
        Err(_) => {
            let _ = dotenvy::dotenv();
        }
    }
}
