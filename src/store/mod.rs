//! Read-only access to stored cluster resources.
//!
//! The decision engine resolves the counterpart of the resource under admission
//! through [`ObjectStore`]. A missing object is a normal outcome (`Ok(None)`) and
//! is kept distinct from a failed lookup (`Err`).

mod kube_store;

pub use kube_store::KubeObjectStore;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::crd::{InfrastructureDescriptor, PlacementRequest};

/// Kinds of resources the store can resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PlacementRequest,
    InfrastructureDescriptor,
}

impl ResourceKind {
    /// Label value used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::PlacementRequest => "placementrequest",
            ResourceKind::InfrastructureDescriptor => "infrastructuredescriptor",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::PlacementRequest => write!(f, "PlacementRequest"),
            ResourceKind::InfrastructureDescriptor => write!(f, "InfrastructureDescriptor"),
        }
    }
}

/// Identifies a single stored resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// A resource as returned by the store.
#[derive(Clone, Debug)]
pub enum StoredResource {
    PlacementRequest(Box<PlacementRequest>),
    InfrastructureDescriptor(Box<InfrastructureDescriptor>),
}

impl StoredResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            StoredResource::PlacementRequest(_) => ResourceKind::PlacementRequest,
            StoredResource::InfrastructureDescriptor(_) => ResourceKind::InfrastructureDescriptor,
        }
    }
}

impl From<PlacementRequest> for StoredResource {
    fn from(value: PlacementRequest) -> Self {
        StoredResource::PlacementRequest(Box::new(value))
    }
}

impl From<InfrastructureDescriptor> for StoredResource {
    fn from(value: InfrastructureDescriptor) -> Self {
        StoredResource::InfrastructureDescriptor(Box::new(value))
    }
}

/// Failure to read a resource for any reason other than absence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Kubernetes API error other than 404
    #[error("Kubernetes API error: {0}")]
    Kube(#[source] kube::Error),

    /// The stored object could not be decoded into its typed form
    #[error("failed to decode {key}: {message}")]
    Decode { key: ResourceKey, message: String },

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

/// Read access to stored resources.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the current stored representation of `key`.
    ///
    /// Returns `Ok(None)` when the resource does not exist.
    async fn fetch(&self, key: &ResourceKey) -> Result<Option<StoredResource>, StoreError>;
}
