//! A local upstream and relay, both on ephemeral ports.

use std::{convert::Infallible, net::SocketAddr, time::Duration};

use axum::{
    Router,
    body::{Body, Bytes},
    extract::Path,
    http::{HeaderMap, Method, StatusCode, header},
    response::IntoResponse,
    routing::{any, get},
};
use cors_relay::{RelayState, app, config::Config};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

pub const HTML: &str = "<!doctype html><html><body><p>héllo, 世界</p></body></html>";
pub const CHUNKS: [&str; 4] = ["first ", "second ", "第三 ", "last"];

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("upstream said {code}"))
}

/// echoes the headers the relay sent, one per line.
async fn echo_headers(headers: HeaderMap) -> String {
    let get = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_owned()
    };
    [
        get(header::USER_AGENT),
        get(header::REFERER),
        get(header::COOKIE),
        get(header::AUTHORIZATION),
    ]
    .join("\n")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn chunked() -> Body {
    let chunks = CHUNKS.map(|c| Ok::<_, Infallible>(Bytes::from_static(c.as_bytes())));
    Body::from_stream(futures_util::stream::iter(chunks))
}

pub fn upstream() -> Router {
    Router::new()
        .route("/html", get(|| async { HTML }))
        .route("/status/{code}", get(status))
        .route(
            "/moved",
            get(|| async { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/html")]) }),
        )
        .route("/echo-headers", get(echo_headers))
        .route("/method", any(|method: Method| async move { method.to_string() }))
        .route("/slow", get(slow))
        .route("/chunked", get(chunked))
}

pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should be able to bind an ephemeral port");
    let addr = listener.local_addr().expect("listener should have an address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("server should keep running");
    });

    addr
}

pub async fn start_upstream() -> SocketAddr {
    serve(upstream()).await
}

/// raw upstream that promises 100 bytes of body, sends a few, then hangs up.
pub async fn start_truncating_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should be able to bind an ephemeral port");
    let addr = listener.local_addr().expect("listener should have an address");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

pub async fn start_relay(config: &Config) -> SocketAddr {
    let state = RelayState::from_config(config).expect("client should build");
    serve(app(state)).await
}

/// url of the relay endpoint for `target`, percent-encoding just what the query needs.
pub fn relay_url(relay: SocketAddr, target: &str) -> String {
    let target = target
        .replace('%', "%25")
        .replace('&', "%26")
        .replace('?', "%3F")
        .replace('=', "%3D")
        .replace('#', "%23")
        .replace(' ', "%20");
    format!("http://{relay}/proxy?url={target}")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .expect("test client should build")
}
