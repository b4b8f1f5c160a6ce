//! Object store backed by the Kubernetes API server.

use async_trait::async_trait;
use kube::{Api, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ObjectStore, ResourceKey, ResourceKind, StoreError, StoredResource};
use crate::crd::{InfrastructureDescriptor, PlacementRequest};

/// Reads resources directly from the API server (no cache).
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl KubeObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<K>(&self, key: &ResourceKey) -> Result<Option<K>, StoreError>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + std::fmt::Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        match api.get(&key.name).await {
            Ok(obj) => Ok(Some(obj)),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                debug!(key = %key, "Resource not found");
                Ok(None)
            }
            Err(kube::Error::SerdeError(e)) => Err(StoreError::Decode {
                key: key.clone(),
                message: e.to_string(),
            }),
            Err(e) => Err(StoreError::Kube(e)),
        }
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn fetch(&self, key: &ResourceKey) -> Result<Option<StoredResource>, StoreError> {
        match key.kind {
            ResourceKind::PlacementRequest => Ok(self
                .get::<PlacementRequest>(key)
                .await?
                .map(StoredResource::from)),
            ResourceKind::InfrastructureDescriptor => Ok(self
                .get::<InfrastructureDescriptor>(key)
                .await?
                .map(StoredResource::from)),
        }
    }
}
