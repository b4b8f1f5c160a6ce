//! PlacementRequest Custom Resource Definition.
//!
//! A PlacementRequest describes where a workload should run and points at the
//! cloud-specific InfrastructureDescriptor that realizes it. The admission
//! webhook only reads these objects; they are owned by the workload controller.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of PlacementRequest resources.
pub const PLACEMENT_GROUP: &str = "placement.smoketurner.com";

/// Kind name of PlacementRequest resources.
pub const PLACEMENT_REQUEST_KIND: &str = "PlacementRequest";

/// PlacementRequest is a generic request to place a workload on provisioned compute.
///
/// Example:
/// ```yaml
/// apiVersion: placement.smoketurner.com/v1alpha1
/// kind: PlacementRequest
/// metadata:
///   name: worker-0
/// spec:
///   clusterName: prod
///   version: v1.32.1
///   infrastructureRef:
///     apiVersion: infrastructure.placement.smoketurner.com/v1alpha1
///     kind: InfrastructureDescriptor
///     name: worker-0
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "placement.smoketurner.com",
    version = "v1alpha1",
    kind = "PlacementRequest",
    plural = "placementrequests",
    shortname = "pr",
    namespaced,
    printcolumn = r#"{"name":"Cluster", "type":"string", "jsonPath":".spec.clusterName"}"#,
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Infrastructure", "type":"string", "jsonPath":".spec.infrastructureRef.name"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequestSpec {
    /// Name of the cluster this placement belongs to.
    #[serde(default)]
    pub cluster_name: String,

    /// Desired software version. When unset, the infrastructure resource
    /// chooses the machine image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Reference to the infrastructure resource backing this placement.
    pub infrastructure_ref: InfrastructureReference,

    /// Provider id copied from the infrastructure once it is provisioned.
    #[serde(
        default,
        rename = "providerID",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_id: Option<String>,
}

/// Reference from a PlacementRequest to its infrastructure resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureReference {
    /// API version of the referenced resource.
    #[serde(default)]
    pub api_version: String,

    /// Kind of the referenced resource.
    pub kind: String,

    /// Name of the referenced resource.
    pub name: String,

    /// Namespace of the referenced resource (defaults to the request's namespace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
