//! placement-admission library crate
//!
//! Validating admission webhook for `PlacementRequest` and
//! `InfrastructureDescriptor` resources. Exports the CRD definitions, the
//! object store used to resolve counterpart resources, the decision engine,
//! and the HTTP servers.

pub mod config;
pub mod crd;
pub mod health;
pub mod store;
pub mod webhooks;

pub use config::WebhookConfig;
pub use health::HealthState;
pub use store::{KubeObjectStore, ObjectStore};
pub use webhooks::{Decision, DecisionEngine, WebhookError, WebhookState, run_webhook_server};
