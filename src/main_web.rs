// Relay server binary

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};

use domain_chat_router::sys_info;
use domain_chat_router::web::response_helpers::cors_preflight;
use domain_chat_router::web::routes;
use domain_chat_router::web::RelayConfig;

async fn handle_request(
    req: Request<Body>,
    config: Arc<RelayConfig>,
) -> Result<Response<Body>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => routes::health::handle(config).await,

        (&Method::GET, "/api/config") => routes::config::handle(config).await,

        (&Method::POST, "/api/chat") => routes::chat::handle(req, config).await,

        (&Method::OPTIONS, _) => Ok(cors_preflight()),

        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not Found"))
            .unwrap()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Arc::new(RelayConfig::from_env());
    sys_info!(
        "[STARTUP] provider_default={} max_new_tokens_limit={} context_tokens_limit={}",
        config.provider_default.as_str(),
        config.max_new_tokens_limit,
        config.context_tokens_limit
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let make_svc = make_service_fn({
        let config = config.clone();
        move |_conn| {
            let config = config.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| handle_request(req, config.clone())))
            }
        }
    });

    let server = Server::bind(&addr).serve(make_svc);

    println!("Domain chat router listening on http://{}", addr);
    println!("Available endpoints:");
    println!("  GET  /health      - Health check");
    println!("  GET  /api/config  - Relay limits and default provider");
    println!("  POST /api/chat    - Relay a conversation to a provider");

    server.await?;

    Ok(())
}
