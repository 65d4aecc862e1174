//! One-shot client: issues a fresh token and calls the gateway with it.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use common_token::{issue_token, load_secret, BEARER_PREFIX};
use tracing_subscriber::EnvFilter;

const URL_ENV: &str = "TOKEN_CLIENT_URL";
const SECRET_ENV: &str = "TOKEN_CLIENT_SECRET";
const DEFAULT_URL: &str = "http://127.0.0.1:8080/";
const DEFAULT_SECRET_PATH: &str = "secret.key";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let url = env::var(URL_ENV).unwrap_or_else(|_| DEFAULT_URL.to_string());
    let secret_path = PathBuf::from(
        env::var(SECRET_ENV).unwrap_or_else(|_| DEFAULT_SECRET_PATH.to_string()),
    );

    let secret = load_secret(&secret_path)
        .with_context(|| format!("loading secret key from {}", secret_path.display()))?;

    let token = issue_token(&secret).context("signing token")?;
    let authorization = format!("{BEARER_PREFIX}{token}");
    println!("Authorization header: {authorization}");

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header(reqwest::header::AUTHORIZATION, &authorization)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?;

    let status = response.status();
    let body = response.text().await.context("reading response body")?;

    println!("Response status: {status}");
    println!("Response body: {body}");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
