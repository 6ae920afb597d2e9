use axum::{
    body::Body,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;

use crate::{RelayState, config::BodyMode, error::RelayError, forward, headers::CORS_HEADERS};

/// pull the first non-empty `url` out of the query string.
fn target_url(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;

    params
        .into_iter()
        .find(|(key, value)| key == "url" && !value.is_empty())
        .map(|(_, url)| url)
}

pub async fn relay(State(state): State<RelayState>, method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        tracing::debug!("answering preflight");
        return (StatusCode::OK, CORS_HEADERS).into_response();
    }

    let Some(url) = target_url(&uri) else {
        tracing::debug!("request without a url");
        return RelayError::MissingUrl.into_response();
    };

    match relay_to(&state, &url).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn relay_to(state: &RelayState, url: &str) -> Result<Response, RelayError> {
    tracing::info!("relaying request to {url}");

    let resp = forward(&state.client, url).await?;
    let status = resp.status();

    let body = match state.body_mode {
        BodyMode::Stream => {
            // the head is already on its way once we start streaming, so failures can only be logged
            let stream = resp
                .bytes_stream()
                .inspect_err(|err| tracing::warn!("upstream body failed mid-stream: {err}"));
            Body::from_stream(stream)
        }
        BodyMode::Buffered => {
            let text = resp.text().await.inspect_err(|err| {
                tracing::warn!("could not read upstream body: {err}");
            })?;
            Body::new(text)
        }
    };

    tracing::info!("sending response {status}");

    Ok((status, CORS_HEADERS, body).into_response())
}
