pub mod helpers;
pub mod observability;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, request};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::observability::{make_span_with_request_id, on_request, on_response};
use crate::routes::{auth_routes, entity_routes, route_segment};
use crate::state::{AuthState, EntityState};

pub use crate::state::{EntityRepository, Otp, RefreshTokens};

/// The assembled HTTP service: auth routes plus one CRUD route set per
/// entity.
pub struct GreenmartService {
    router: Router,
}

impl GreenmartService {
    pub fn new(auth_state: AuthState, entity_states: Vec<EntityState>) -> Self {
        let mut router = Router::new().nest("/auth", auth_routes(auth_state));
        for state in entity_states {
            let segment = route_segment(state.repository.entity());
            router = router.nest(&format!("/{segment}"), entity_routes(state));
        }
        Self { router }
    }

    fn with_trace_layer(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        );
        self
    }

    /// Final router, optionally restricted to a CORS origin allowlist.
    pub fn into_router(mut self, allowed_origins: Option<Vec<HeaderValue>>) -> Router {
        if let Some(allowed_origins) = allowed_origins {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));
            self.router = self.router.layer(cors);
        }
        self.with_trace_layer().router
    }

    /// Run the service as a standalone server.
    pub async fn run_standalone(
        self,
        listener: TcpListener,
        allowed_origins: Option<Vec<HeaderValue>>,
    ) -> Result<(), std::io::Error> {
        let router = self.into_router(allowed_origins);

        tracing::info!("Greenmart service listening on {}", listener.local_addr()?);

        axum_server::Server::<std::net::SocketAddr>::from_listener(listener)
            .serve(router.into_make_service())
            .await
    }
}
