//! Task that owns the backend client for the lifetime of the app.
//!
//! Requests arrive on an unbounded channel; each one is served on its own
//! tokio task so a slow chat reply never holds up a profile refresh. At most
//! one request per encounter operation is in flight, which the encounter
//! state machine enforces before a ticket is issued.

use dentsim_core::auth::AuthService;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::api::types::{ApiRequest, ApiResponse};
use crate::event::AppEvent;

/// Spawns the dispatcher loop. It exits when every request sender is dropped.
pub fn spawn_api_worker(
    service: AuthService,
    mut rx: UnboundedReceiver<ApiRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let service = service.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let response = handle_request(&service, request).await;
                let _ = event_tx.send(AppEvent::ApiResult(Box::new(response)));
            });
        }
        debug!("api worker stopped");
    });
}

/// Performs one request against the backend.
pub async fn handle_request(service: &AuthService, request: ApiRequest) -> ApiResponse {
    let backend = service.backend();
    match request {
        ApiRequest::Login {
            generation,
            credentials,
        } => ApiResponse::LoggedIn {
            generation,
            outcome: service.login(generation, &credentials).await,
        },
        ApiRequest::Register(registration) => {
            ApiResponse::Registered(backend.register(&registration).await)
        }
        ApiRequest::RefreshProfile { generation, token } => ApiResponse::Profile {
            generation,
            outcome: service.refresh_profile(generation, &token).await,
        },
        ApiRequest::UpdateProfile {
            generation,
            token,
            current,
            update,
        } => ApiResponse::ProfileUpdated {
            generation,
            outcome: service
                .update_profile(generation, &token, current, &update)
                .await,
        },
        ApiRequest::ChangePassword {
            generation,
            token,
            change,
        } => ApiResponse::PasswordChanged {
            generation,
            outcome: service.change_password(&token, &change).await,
        },
        ApiRequest::StartCase { token, ticket } => ApiResponse::CaseStarted {
            ticket,
            outcome: backend.start_case(&token).await,
        },
        ApiRequest::Chat { token, ticket } => {
            let outcome = backend
                .chat(&token, &ticket.session_id, &ticket.message)
                .await;
            ApiResponse::ChatReply { ticket, outcome }
        }
        ApiRequest::Diagnose { token, ticket } => {
            let outcome = backend
                .diagnose(&token, &ticket.session_id, &ticket.diagnosis)
                .await;
            ApiResponse::Verdict { ticket, outcome }
        }
        ApiRequest::Logout { generation } => {
            service.teardown(generation).await;
            ApiResponse::LoggedOut
        }
    }
}
