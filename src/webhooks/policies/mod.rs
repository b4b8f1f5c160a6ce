//! Validation policies for PlacementRequest and InfrastructureDescriptor admission.
//!
//! Policies are pure functions over typed resources:
//! - `image_source`: cross-resource check that a version or a machine image is set
//! - `immutability`: InfrastructureDescriptor spec fields that cannot change after creation

pub mod image_source;
pub mod immutability;

use std::fmt;

/// Terminal outcome of an admission evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The write may proceed.
    Allow,
    /// An invariant is violated; the caller must correct the resource.
    Deny(Denial),
    /// The gate could not decide (failed lookup, timeout, bad counterpart).
    Error(String),
}

impl Decision {
    /// Build a denial for a required field.
    pub fn required(field: &str, message: &str) -> Self {
        Decision::Deny(Denial {
            reason: DenialReason::Required,
            field: field.to_string(),
            message: message.to_string(),
        })
    }

    /// Build a denial for a field that may not be set or changed.
    pub fn forbidden(field: &str, message: &str) -> Self {
        Decision::Deny(Denial {
            reason: DenialReason::Forbidden,
            field: field.to_string(),
            message: message.to_string(),
        })
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny(_) => "deny",
            Decision::Error(_) => "error",
        }
    }
}

/// Why a write was denied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    /// Path of the offending field (e.g. `spec.amiID`).
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Classification of a denial, rendered as the response reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenialReason {
    Required,
    Forbidden,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Required => write!(f, "Required"),
            DenialReason::Forbidden => write!(f, "Forbidden"),
        }
    }
}
