pub mod dashboards;
pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    system::tracing::initialize()?;

    async fn request_logger(req: Request<Body>, next: Next) -> Response {
        let start = std::time::Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = next.run(req).await;

        tracing::info!(
            "{} {} {} {}ms",
            response.status().as_u16(),
            method,
            uri.path(),
            start.elapsed().as_millis()
        );
        response
    }

    let config = shared::config::load_config()?;
    let ctx = Arc::new(system::initialization::initialize(&config).await?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    let app = routes::configure_routes(ctx)
        .layer(middleware::from_fn(request_logger))
        .layer(cors);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
