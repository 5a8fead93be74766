use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use event_wire::{CreateEventRequest, Event, Ticket};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::error::{ApiError, ApiResult};
use crate::service::TicketService;

/// Requests handled at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

#[derive(Clone)]
pub struct AppState {
    service: TicketService,
    permits: Arc<Semaphore>,
}

impl AppState {
    #[must_use]
    pub fn new(service: TicketService, max_concurrency: usize) -> Self {
        Self {
            service,
            permits: Arc::new(Semaphore::new(max_concurrency)),
        }
    }
}

/// Request bodies are only read once a permit is held.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/events", post(create_event).get(list_events))
        .route("/api/v1/events/:id/book", post(book_tickets))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            limit_concurrency,
        ))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Failed to serve ticket API")
}

async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResult<Json<Event>> {
    let Json(request) = body.map_err(ApiError::InvalidBody)?;
    let event = state.service.create_event(request);
    tracing::debug!(id = %event.id, "created event");
    Ok(Json(event))
}

async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(state.service.list_events()))
}

#[derive(Debug, Deserialize)]
struct BookParams {
    tickets: Option<String>,
}

async fn book_tickets(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    params: Option<Query<BookParams>>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let count = parse_ticket_count(params.and_then(|Query(p)| p.tickets).as_deref())?;
    let tickets = state.service.book_tickets(&event_id, count)?;
    tracing::debug!(event = %event_id, count, "booked tickets");
    Ok(Json(tickets))
}

fn parse_ticket_count(raw: Option<&str>) -> ApiResult<u32> {
    match raw {
        None => Ok(1),
        Some(raw) => match raw.parse::<u32>() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(ApiError::InvalidTicketCount),
        },
    }
}

async fn limit_concurrency(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let _permit = state
        .permits
        .acquire()
        .await
        .map_err(|_| ApiError::ShuttingDown)?;
    Ok(next.run(request).await)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned());

    let response = next.run(request).await;

    tracing::info!(
        %method,
        path = %path,
        client = %client,
        status = response.status().as_u16(),
        "handled request"
    );
    response
}
