//! Admission webhook server.
//!
//! Provides HTTP endpoints for Kubernetes admission webhooks:
//! - `POST /validate-infrastructuredescriptor`
//! - `POST /validate-placementrequest`
//!
//! To enable webhooks:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at both paths
//! 3. Mount the TLS certificate secret to the pod at /etc/webhook/certs/
//!
//! Decoding the AdmissionReview and rendering the response happens here; the
//! decision itself is made by the [`DecisionEngine`].

use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use kube::Resource;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::WebhookConfig;
use crate::crd::{InfrastructureDescriptor, PlacementRequest};
use crate::health::HealthState;
use crate::store::ResourceKind;
use crate::webhooks::engine::{Admission, AdmissionOperation, DecisionEngine};
use crate::webhooks::policies::Decision;

/// Shared state for webhook handlers
pub struct WebhookState {
    pub engine: DecisionEngine,
    pub health: Arc<HealthState>,
}

impl WebhookState {
    pub fn new(engine: DecisionEngine, health: Arc<HealthState>) -> Self {
        Self { engine, health }
    }
}

/// A request that cannot be evaluated because it is missing required objects
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedInput {
    #[error("Missing object in {0} request")]
    MissingObject(&'static str),

    #[error("Missing oldObject in UPDATE request")]
    MissingOldObject,
}

/// Resource types served by the webhook.
trait AdmissionTarget:
    Resource<DynamicType = ()> + Clone + DeserializeOwned + Serialize + Send + Sync + 'static
{
    const KIND: ResourceKind;

    fn admission(op: AdmissionOperation<'_, Self>) -> Admission<'_>;
}

impl AdmissionTarget for InfrastructureDescriptor {
    const KIND: ResourceKind = ResourceKind::InfrastructureDescriptor;

    fn admission(op: AdmissionOperation<'_, Self>) -> Admission<'_> {
        Admission::InfrastructureDescriptor(op)
    }
}

impl AdmissionTarget for PlacementRequest {
    const KIND: ResourceKind = ResourceKind::PlacementRequest;

    fn admission(op: AdmissionOperation<'_, Self>) -> Admission<'_> {
        Admission::PlacementRequest(op)
    }
}

/// Owned form of the operation, with namespaces filled in from the request.
#[derive(Debug)]
enum RequestedOperation<T> {
    Create(T),
    Update { old: T, new: T },
    Delete,
    Connect,
}

impl<T> RequestedOperation<T> {
    fn as_str(&self) -> &'static str {
        match self {
            RequestedOperation::Create(_) => "create",
            RequestedOperation::Update { .. } => "update",
            RequestedOperation::Delete => "delete",
            RequestedOperation::Connect => "connect",
        }
    }
}

/// Objects in CREATE requests may omit the namespace; the request carries it.
fn with_request_namespace<T: Resource + Clone>(object: &T, namespace: Option<&str>) -> T {
    let mut object = object.clone();
    if object.meta().namespace.is_none() {
        object.meta_mut().namespace = namespace.map(str::to_string);
    }
    object
}

fn requested_operation<T: Resource + Clone>(
    request: &AdmissionRequest<T>,
) -> Result<RequestedOperation<T>, MalformedInput> {
    let namespace = request.namespace.as_deref();
    match request.operation {
        Operation::Create => {
            let object = request
                .object
                .as_ref()
                .ok_or(MalformedInput::MissingObject("CREATE"))?;
            Ok(RequestedOperation::Create(with_request_namespace(
                object, namespace,
            )))
        }
        Operation::Update => {
            let new = request
                .object
                .as_ref()
                .ok_or(MalformedInput::MissingObject("UPDATE"))?;
            let old = request
                .old_object
                .as_ref()
                .ok_or(MalformedInput::MissingOldObject)?;
            Ok(RequestedOperation::Update {
                old: with_request_namespace(old, namespace),
                new: with_request_namespace(new, namespace),
            })
        }
        // The deleted object is never inspected
        Operation::Delete => Ok(RequestedOperation::Delete),
        Operation::Connect => Ok(RequestedOperation::Connect),
    }
}

/// Create a denial response with reason embedded in message.
/// kube-rs deny() only sets status.message, so we format as "[reason] message"
fn deny_with_reason<T: Resource<DynamicType = ()>>(
    request: &AdmissionRequest<T>,
    message: &str,
    reason: &str,
) -> AdmissionReview<DynamicObject> {
    let full_message = format!("[{}] {}", reason, message);
    AdmissionResponse::from(request)
        .deny(full_message)
        .into_review()
}

/// Render a decision into the review returned to the API server
fn render<T: Resource<DynamicType = ()>>(
    request: &AdmissionRequest<T>,
    decision: &Decision,
) -> AdmissionReview<DynamicObject> {
    let uid = &request.uid;
    match decision {
        Decision::Allow => {
            info!(uid = %uid, "Admission request allowed");
            AdmissionResponse::from(request).into_review()
        }
        Decision::Deny(denial) => {
            warn!(
                uid = %uid,
                reason = %denial.reason,
                field = %denial.field,
                message = %denial.message,
                "Admission request denied"
            );
            deny_with_reason(request, &denial.message, &denial.reason.to_string())
        }
        Decision::Error(cause) => {
            error!(uid = %uid, cause = %cause, "Admission request could not be evaluated");
            deny_with_reason(request, cause, "InternalError")
        }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(
            "/validate-infrastructuredescriptor",
            post(validate::<InfrastructureDescriptor>),
        )
        .route(
            "/validate-placementrequest",
            post(validate::<PlacementRequest>),
        )
        .with_state(state)
}

/// Admission handler shared by both resource kinds
async fn validate<T>(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<T>>,
) -> (StatusCode, Json<AdmissionReview<DynamicObject>>)
where
    T: AdmissionTarget,
{
    let request: AdmissionRequest<T> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    debug!(
        uid = %request.uid,
        kind = %T::KIND,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = %request.name,
        dry_run = request.dry_run,
        "Processing admission request"
    );

    let operation = match requested_operation(&request) {
        Ok(op) => op,
        Err(e) => {
            error!(uid = %request.uid, error = %e, "Malformed admission request");
            return (
                StatusCode::OK,
                Json(deny_with_reason(&request, &e.to_string(), "InvalidRequest")),
            );
        }
    };

    let started = Instant::now();
    let decision = match &operation {
        RequestedOperation::Create(object) => {
            let admission = T::admission(AdmissionOperation::Create(object));
            state.engine.evaluate(admission).await
        }
        RequestedOperation::Update { old, new } => {
            let admission = T::admission(AdmissionOperation::Update { old, new });
            state.engine.evaluate(admission).await
        }
        RequestedOperation::Delete => {
            state
                .engine
                .evaluate(T::admission(AdmissionOperation::Delete))
                .await
        }
        RequestedOperation::Connect => Decision::Allow,
    };

    state.health.metrics.record_decision(
        T::KIND.as_str(),
        operation.as_str(),
        &decision,
        started.elapsed().as_secs_f64(),
    );

    (StatusCode::OK, Json(render(&request, &decision)))
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0 on the configured port and serves both validation
/// endpoints. Readiness is reported once the TLS material has loaded.
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    config: &WebhookConfig,
) -> Result<(), WebhookError> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;

    let health = state.health.clone();
    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    info!(port = config.webhook_port, "Webhook server listening with TLS");
    health.set_ready(true).await;

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
