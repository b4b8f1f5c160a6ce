//! Webhook module for validating admission requests.
//!
//! This module provides ValidatingAdmissionWebhooks for the placement resources:
//! - InfrastructureDescriptor CREATE: owner must supply a version or the descriptor an image
//! - InfrastructureDescriptor UPDATE: spec is immutable apart from a small allow-list
//! - PlacementRequest CREATE/UPDATE: referenced descriptor must agree on the image source
//! - DELETE: always allowed

pub mod engine;
pub mod policies;
mod server;

pub use engine::{Admission, AdmissionOperation, DecisionEngine, ResolutionError};
pub use policies::{Decision, Denial, DenialReason};
pub use server::{
    MalformedInput, WebhookError, WebhookState, create_webhook_router, run_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
