use std::env;
use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Rocket, State};

use super::cors::{api_preflight, Cors};
use super::models::{DecryptPasteResponse, HealthResponse};
use crate::{FetchError, Fetcher, HttpFetcher, PasteClient};

pub type SharedFetcher = Arc<dyn Fetcher>;

const ADDRESS_ENV: &str = "PBDECRYPT_ADDRESS";
const PORT_ENV: &str = "PBDECRYPT_PORT";

pub fn build_rocket(fetcher: SharedFetcher) -> Rocket<Build> {
    rocket::build()
        .manage(fetcher)
        .attach(Cors::from_env())
        .mount("/", routes![health, decrypt_paste_api, api_preflight])
}

#[get("/")]
fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online".to_string(),
        message: "pbdecrypt API is running".to_string(),
        version: env!("PBDECRYPT_VERSION").to_string(),
    })
}

#[get("/api/decrypt-paste?<paste_url>")]
async fn decrypt_paste_api(
    fetcher: &State<SharedFetcher>,
    paste_url: Option<String>,
) -> Result<Json<DecryptPasteResponse>, (Status, String)> {
    let paste_url = paste_url.unwrap_or_default().trim().to_string();
    if paste_url.is_empty() {
        return Err((Status::BadRequest, "Paste URL cannot be empty".into()));
    }
    if !paste_url.contains('#') {
        return Err((
            Status::BadRequest,
            "Paste URL must contain encryption key (#key)".into(),
        ));
    }

    let fetcher = fetcher.inner().clone();
    let outcome =
        tokio::task::spawn_blocking(move || PasteClient::new(fetcher).decrypt(&paste_url))
            .await
            .map_err(|e| {
                (
                    Status::InternalServerError,
                    format!("decryption task failed: {e}"),
                )
            })?;

    let response = match outcome {
        Ok(urls) => DecryptPasteResponse::success(urls),
        Err(error) => {
            log::warn!("decrypt-paste failed: {}", error);
            DecryptPasteResponse::failure(&error)
        }
    };
    Ok(Json(response))
}

pub fn server_config() -> Result<rocket::Config, Box<dyn std::error::Error>> {
    let address = env::var(ADDRESS_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match env::var(PORT_ENV) {
        Ok(value) => value.trim().parse()?,
        Err(_) => 8000,
    };

    Ok(rocket::Config {
        address: address.trim().parse()?,
        port,
        ..rocket::Config::release_default()
    })
}

pub fn default_fetcher() -> Result<SharedFetcher, FetchError> {
    Ok(Arc::new(HttpFetcher::from_env()?))
}

pub async fn launch(fetcher: SharedFetcher) -> Result<(), Box<dyn std::error::Error>> {
    let config = server_config()?;
    log::info!("listening on {}:{}", config.address, config.port);

    build_rocket(fetcher).configure(config).launch().await?;

    Ok(())
}
