//! Decision engine for admission requests.
//!
//! Dispatches on resource kind and operation, resolves the counterpart resource
//! through the [`ObjectStore`] when a cross-resource rule applies, and returns a
//! terminal [`Decision`]. Each evaluation is independent; the engine holds no
//! mutable state and performs at most one read per call.

use std::sync::Arc;
use std::time::Duration;

use kube::ResourceExt;
use thiserror::Error;
use tracing::{Instrument, Span, debug};

use crate::crd::{
    INFRASTRUCTURE_DESCRIPTOR_KIND, InfrastructureDescriptor, PLACEMENT_GROUP,
    PLACEMENT_REQUEST_KIND, PlacementRequest,
};
use crate::store::{ObjectStore, ResourceKey, ResourceKind, StoreError, StoredResource};
use crate::webhooks::policies::{Decision, image_source, immutability};

/// Operation under admission, carrying the objects it needs.
#[derive(Debug)]
pub enum AdmissionOperation<'a, T> {
    Create(&'a T),
    Update { old: &'a T, new: &'a T },
    Delete,
}

impl<T> AdmissionOperation<'_, T> {
    /// Label value used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionOperation::Create(_) => "create",
            AdmissionOperation::Update { .. } => "update",
            AdmissionOperation::Delete => "delete",
        }
    }
}

/// An admission request for one of the validated resource kinds.
#[derive(Debug)]
pub enum Admission<'a> {
    InfrastructureDescriptor(AdmissionOperation<'a, InfrastructureDescriptor>),
    PlacementRequest(AdmissionOperation<'a, PlacementRequest>),
}

impl Admission<'_> {
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            Admission::InfrastructureDescriptor(_) => ResourceKind::InfrastructureDescriptor,
            Admission::PlacementRequest(_) => ResourceKind::PlacementRequest,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Admission::InfrastructureDescriptor(op) => op.as_str(),
            Admission::PlacementRequest(op) => op.as_str(),
        }
    }
}

/// Failure to resolve a counterpart resource for a reason other than absence.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("timed out after {after:?} fetching {key}")]
    Timeout { key: ResourceKey, after: Duration },

    #[error("expected {expected} for {key}, store returned {found}")]
    UnexpectedKind {
        key: ResourceKey,
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("{kind} {name} has no namespace")]
    MissingNamespace { kind: ResourceKind, name: String },
}

/// Evaluates admission requests against the placement policies.
pub struct DecisionEngine {
    store: Arc<dyn ObjectStore>,
    fetch_timeout: Duration,
    span: Span,
}

impl DecisionEngine {
    /// Create an engine.
    ///
    /// Every store read is bounded by `fetch_timeout`. Events emitted during
    /// evaluation are recorded inside `span`.
    pub fn new(store: Arc<dyn ObjectStore>, fetch_timeout: Duration, span: Span) -> Self {
        Self {
            store,
            fetch_timeout,
            span,
        }
    }

    /// Decide whether the write described by `admission` may proceed.
    pub async fn evaluate(&self, admission: Admission<'_>) -> Decision {
        let span = self.span.clone();
        async move {
            match admission {
                Admission::InfrastructureDescriptor(op) => match op {
                    AdmissionOperation::Create(descriptor) => {
                        self.admit_descriptor_create(descriptor).await
                    }
                    AdmissionOperation::Update { old, new } => {
                        immutability::validate_update(old, new)
                    }
                    AdmissionOperation::Delete => Decision::Allow,
                },
                Admission::PlacementRequest(op) => match op {
                    AdmissionOperation::Create(request)
                    | AdmissionOperation::Update { new: request, .. } => {
                        self.admit_placement(request).await
                    }
                    AdmissionOperation::Delete => Decision::Allow,
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn admit_descriptor_create(&self, descriptor: &InfrastructureDescriptor) -> Decision {
        let key = match owner_key(descriptor) {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!(name = %descriptor.name_any(), "No owning PlacementRequest reference");
                return Decision::Allow;
            }
            Err(e) => return Decision::Error(e.to_string()),
        };

        match self.resolve_placement_request(&key).await {
            Ok(Some(owner)) => image_source::validate_descriptor(&owner, descriptor),
            // The descriptor may be provisioned ahead of its owner
            Ok(None) => {
                debug!(owner = %key, "Owning PlacementRequest not found");
                Decision::Allow
            }
            Err(e) => Decision::Error(e.to_string()),
        }
    }

    async fn admit_placement(&self, request: &PlacementRequest) -> Decision {
        let reference = &request.spec.infrastructure_ref;
        if reference.kind != INFRASTRUCTURE_DESCRIPTOR_KIND {
            debug!(kind = %reference.kind, "Infrastructure kind not validated");
            return Decision::Allow;
        }

        let Some(namespace) = reference.namespace.clone().or_else(|| request.namespace()) else {
            return Decision::Error(
                ResolutionError::MissingNamespace {
                    kind: ResourceKind::PlacementRequest,
                    name: request.name_any(),
                }
                .to_string(),
            );
        };
        let key = ResourceKey::new(
            ResourceKind::InfrastructureDescriptor,
            namespace,
            &reference.name,
        );

        match self.resolve_infrastructure_descriptor(&key).await {
            Ok(Some(descriptor)) => image_source::validate_placement(request, &descriptor),
            Ok(None) => {
                debug!(infrastructure = %key, "InfrastructureDescriptor not found");
                Decision::Allow
            }
            Err(e) => Decision::Error(e.to_string()),
        }
    }

    async fn fetch(&self, key: &ResourceKey) -> Result<Option<StoredResource>, ResolutionError> {
        match tokio::time::timeout(self.fetch_timeout, self.store.fetch(key)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ResolutionError::Timeout {
                key: key.clone(),
                after: self.fetch_timeout,
            }),
        }
    }

    async fn resolve_placement_request(
        &self,
        key: &ResourceKey,
    ) -> Result<Option<PlacementRequest>, ResolutionError> {
        match self.fetch(key).await? {
            None => Ok(None),
            Some(StoredResource::PlacementRequest(request)) => Ok(Some(*request)),
            Some(other) => Err(ResolutionError::UnexpectedKind {
                key: key.clone(),
                expected: ResourceKind::PlacementRequest,
                found: other.kind(),
            }),
        }
    }

    async fn resolve_infrastructure_descriptor(
        &self,
        key: &ResourceKey,
    ) -> Result<Option<InfrastructureDescriptor>, ResolutionError> {
        match self.fetch(key).await? {
            None => Ok(None),
            Some(StoredResource::InfrastructureDescriptor(descriptor)) => Ok(Some(*descriptor)),
            Some(other) => Err(ResolutionError::UnexpectedKind {
                key: key.clone(),
                expected: ResourceKind::InfrastructureDescriptor,
                found: other.kind(),
            }),
        }
    }
}

/// Key of the PlacementRequest owning `descriptor`, if it names one.
fn owner_key(descriptor: &InfrastructureDescriptor) -> Result<Option<ResourceKey>, ResolutionError> {
    let Some(owner) = descriptor.owner_references().iter().find(|r| {
        r.kind == PLACEMENT_REQUEST_KIND && api_group(&r.api_version) == PLACEMENT_GROUP
    }) else {
        return Ok(None);
    };

    let namespace = descriptor
        .namespace()
        .ok_or_else(|| ResolutionError::MissingNamespace {
            kind: ResourceKind::InfrastructureDescriptor,
            name: descriptor.name_any(),
        })?;
    Ok(Some(ResourceKey::new(
        ResourceKind::PlacementRequest,
        namespace,
        &owner.name,
    )))
}

/// Group part of an `apiVersion` (`group/version`, or empty for the core group).
fn api_group(api_version: &str) -> &str {
    api_version
        .split_once('/')
        .map(|(group, _)| group)
        .unwrap_or_default()
}
