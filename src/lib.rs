pub mod config;
pub mod error;
pub mod headers;
pub mod relay;

use axum::{Router, http::header, routing::any};
use reqwest::{Client, redirect};
use tower_http::trace::TraceLayer;

use config::{BodyMode, Config};
use error::RelayError;
use headers::{BROWSER_USER_AGENT, SPOOFED_REFERER};

/// Shared by every request; cloning is cheap since `Client` is reference counted.
#[derive(Clone, Debug)]
pub struct RelayState {
    pub client: Client,
    pub body_mode: BodyMode,
}

impl RelayState {
    pub fn new(client: Client, body_mode: BodyMode) -> Self {
        Self { client, body_mode }
    }

    /// build the outbound client described by `config`.
    ///
    /// # Errors
    ///
    /// if the tls backend can't be initialised
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let redirects = if config.follow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder().redirect(redirects);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::new(builder.build()?, config.body_mode))
    }
}

/// the relay router, mounted at `/proxy` and `/api/proxy`.
pub fn app(state: RelayState) -> Router {
    Router::new()
        .route("/proxy", any(relay::relay))
        .route("/api/proxy", any(relay::relay))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// GET `url` dressed up as a desktop browser coming from google.
///
/// # Errors
///
/// if the request could not be sent or no response head came back
pub async fn forward(client: &Client, url: &str) -> Result<reqwest::Response, RelayError> {
    client
        .get(url)
        .header(header::USER_AGENT, BROWSER_USER_AGENT)
        .header(header::REFERER, SPOOFED_REFERER)
        .send()
        .await
        .map_err(|err| {
            tracing::warn!("failed to reach upstream: {err}");
            RelayError::Upstream(err)
        })
}
