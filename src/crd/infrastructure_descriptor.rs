//! InfrastructureDescriptor Custom Resource Definition.
//!
//! Describes how the compute backing a PlacementRequest is provisioned on the
//! cloud provider. Most of the spec is fixed once the instance exists; only the
//! fields listed in [`MUTABLE_FIELDS`](crate::webhooks::policies::immutability::MUTABLE_FIELDS)
//! may change afterwards.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of InfrastructureDescriptor resources.
pub const INFRASTRUCTURE_GROUP: &str = "infrastructure.placement.smoketurner.com";

/// Kind name the webhook recognizes in `PlacementRequest.spec.infrastructureRef.kind`.
pub const INFRASTRUCTURE_DESCRIPTOR_KIND: &str = "InfrastructureDescriptor";

/// InfrastructureDescriptor provisions a single cloud instance.
///
/// Example:
/// ```yaml
/// apiVersion: infrastructure.placement.smoketurner.com/v1alpha1
/// kind: InfrastructureDescriptor
/// metadata:
///   name: worker-0
///   ownerReferences:
///     - apiVersion: placement.smoketurner.com/v1alpha1
///       kind: PlacementRequest
///       name: worker-0
///       uid: 7d0c...
/// spec:
///   instanceType: m5.large
///   amiID: ami-0123456789abcdef0
///   additionalTags:
///     team: storage
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.placement.smoketurner.com",
    version = "v1alpha1",
    kind = "InfrastructureDescriptor",
    plural = "infrastructuredescriptors",
    shortname = "infd",
    namespaced,
    printcolumn = r#"{"name":"Instance Type", "type":"string", "jsonPath":".spec.instanceType"}"#,
    printcolumn = r#"{"name":"AMI", "type":"string", "jsonPath":".spec.amiID"}"#,
    printcolumn = r#"{"name":"Provider ID", "type":"string", "jsonPath":".spec.providerID"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureDescriptorSpec {
    // === Mutable after creation ===
    /// Cloud provider id of the instance, set once it is running.
    #[serde(
        default,
        rename = "providerID",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_id: Option<String>,

    /// Extra tags applied to the instance in addition to the defaults.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_tags: BTreeMap<String, String>,

    /// Extra security groups attached to the instance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_security_groups: Vec<SecurityGroupReference>,

    // === Immutable after creation ===
    /// Machine image id. When unset, the owning PlacementRequest must set
    /// `spec.version` so an image can be looked up.
    #[serde(default, rename = "amiID", skip_serializing_if = "Option::is_none")]
    pub ami_id: Option<String>,

    /// Organization used to look up images when `amiID` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_lookup_org: Option<String>,

    /// Instance type (e.g. m5.large).
    #[serde(default)]
    pub instance_type: String,

    /// IAM instance profile assigned to the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_instance_profile: Option<String>,

    /// SSH key pair name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_name: Option<String>,

    /// Whether to assign a public IP.
    #[serde(default, rename = "publicIP", skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<bool>,

    /// Subnet id to launch the instance into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,

    /// Root volume configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<VolumeSpec>,
}

/// Reference to a cloud security group.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupReference {
    /// Security group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Security group ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

/// Block device settings for the root volume.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Size in GiB.
    pub size: i64,

    /// Volume type (e.g. gp3).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,

    /// Whether the volume is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
}
