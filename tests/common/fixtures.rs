//! Test fixtures and builder patterns for placement resources.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use placement_admission::crd::{
    INFRASTRUCTURE_DESCRIPTOR_KIND, InfrastructureDescriptor, InfrastructureDescriptorSpec,
    InfrastructureReference, PlacementRequest, PlacementRequestSpec, SecurityGroupReference,
};

/// Namespace used by fixtures unless overridden.
pub const TEST_NAMESPACE: &str = "default";

/// Builder for creating PlacementRequest test fixtures.
///
/// # Example
/// ```
/// let request = PlacementRequestBuilder::new("worker-0")
///     .version("v1.32.1")
///     .infrastructure("worker-0")
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct PlacementRequestBuilder {
    name: String,
    namespace: Option<String>,
    version: Option<String>,
    infrastructure_kind: String,
    infrastructure_name: String,
    infrastructure_namespace: Option<String>,
}

impl PlacementRequestBuilder {
    /// Create a new builder with the given resource name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            infrastructure_name: name.clone(),
            name,
            namespace: Some(TEST_NAMESPACE.to_string()),
            version: None,
            infrastructure_kind: INFRASTRUCTURE_DESCRIPTOR_KIND.to_string(),
            infrastructure_namespace: None,
        }
    }

    /// Set the namespace (None leaves it unset).
    pub fn namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace.map(str::to_string);
        self
    }

    /// Set spec.version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Point the infrastructure reference at a descriptor of the given name.
    pub fn infrastructure(mut self, name: impl Into<String>) -> Self {
        self.infrastructure_name = name.into();
        self
    }

    /// Set the kind of the infrastructure reference.
    pub fn infrastructure_kind(mut self, kind: impl Into<String>) -> Self {
        self.infrastructure_kind = kind.into();
        self
    }

    /// Set an explicit namespace on the infrastructure reference.
    pub fn infrastructure_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.infrastructure_namespace = Some(namespace.into());
        self
    }

    /// Build the PlacementRequest.
    pub fn build(self) -> PlacementRequest {
        PlacementRequest {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                ..Default::default()
            },
            spec: PlacementRequestSpec {
                cluster_name: "test-cluster".to_string(),
                version: self.version,
                infrastructure_ref: InfrastructureReference {
                    api_version: "infrastructure.placement.smoketurner.com/v1alpha1".to_string(),
                    kind: self.infrastructure_kind,
                    name: self.infrastructure_name,
                    namespace: self.infrastructure_namespace,
                },
                provider_id: None,
            },
        }
    }
}

/// Builder for creating InfrastructureDescriptor test fixtures.
#[derive(Clone, Debug)]
pub struct InfrastructureDescriptorBuilder {
    name: String,
    namespace: Option<String>,
    owner: Option<String>,
    spec: InfrastructureDescriptorSpec,
}

impl InfrastructureDescriptorBuilder {
    /// Create a new builder with the given resource name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(TEST_NAMESPACE.to_string()),
            owner: None,
            spec: InfrastructureDescriptorSpec {
                instance_type: "m5.large".to_string(),
                ..Default::default()
            },
        }
    }

    /// Set the namespace (None leaves it unset).
    pub fn namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace.map(str::to_string);
        self
    }

    /// Add an owner reference to the PlacementRequest with the given name.
    pub fn owner(mut self, name: impl Into<String>) -> Self {
        self.owner = Some(name.into());
        self
    }

    /// Set spec.amiID.
    pub fn ami_id(mut self, ami_id: impl Into<String>) -> Self {
        self.spec.ami_id = Some(ami_id.into());
        self
    }

    /// Set spec.providerID.
    pub fn provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.spec.provider_id = Some(provider_id.into());
        self
    }

    /// Set spec.instanceType.
    pub fn instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.spec.instance_type = instance_type.into();
        self
    }

    /// Add an entry to spec.additionalTags.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.additional_tags.insert(key.into(), value.into());
        self
    }

    /// Add a security group id to spec.additionalSecurityGroups.
    pub fn security_group(mut self, id: impl Into<String>) -> Self {
        self.spec
            .additional_security_groups
            .push(SecurityGroupReference {
                id: Some(id.into()),
                arn: None,
            });
        self
    }

    /// Set spec.subnet.
    pub fn subnet(mut self, subnet: impl Into<String>) -> Self {
        self.spec.subnet = Some(subnet.into());
        self
    }

    /// Build the InfrastructureDescriptor.
    pub fn build(self) -> InfrastructureDescriptor {
        let owner_references = self.owner.map(|owner| {
            vec![OwnerReference {
                api_version: "placement.smoketurner.com/v1alpha1".to_string(),
                kind: "PlacementRequest".to_string(),
                uid: format!("test-uid-{}", owner),
                name: owner,
                controller: Some(true),
                ..Default::default()
            }]
        });

        InfrastructureDescriptor {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                owner_references,
                labels: Some(BTreeMap::from([(
                    "placement.smoketurner.com/cluster-name".to_string(),
                    "test-cluster".to_string(),
                )])),
                ..Default::default()
            },
            spec: self.spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_builder_defaults() {
        let request = PlacementRequestBuilder::new("worker-0").build();
        assert_eq!(request.metadata.name.as_deref(), Some("worker-0"));
        assert_eq!(request.spec.infrastructure_ref.name, "worker-0");
        assert!(request.spec.version.is_none());
    }

    #[test]
    fn test_descriptor_builder_owner() {
        let descriptor = InfrastructureDescriptorBuilder::new("worker-0")
            .owner("worker-0")
            .build();
        let owners = descriptor.metadata.owner_references.unwrap_or_default();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners.first().map(|o| o.kind.as_str()), Some("PlacementRequest"));
    }
}
