//! Image source validation policy.
//!
//! Enforced on InfrastructureDescriptor CREATE and PlacementRequest CREATE/UPDATE.
//!
//! An instance needs a machine image. Either the PlacementRequest names a
//! version (used to look the image up) or the InfrastructureDescriptor pins an
//! image id. At least one of the two must be set.

use super::Decision;
use crate::crd::{InfrastructureDescriptor, PlacementRequest};

/// Returns true iff at least one of `version` and `ami_id` is set.
///
/// Empty strings count as unset.
pub fn image_source_specified(version: Option<&str>, ami_id: Option<&str>) -> bool {
    let set = |v: Option<&str>| v.is_some_and(|s| !s.is_empty());
    set(version) || set(ami_id)
}

/// Validate a new InfrastructureDescriptor against its owning PlacementRequest.
pub fn validate_descriptor(owner: &PlacementRequest, descriptor: &InfrastructureDescriptor) -> Decision {
    if image_source_specified(owner.spec.version.as_deref(), descriptor.spec.ami_id.as_deref()) {
        return Decision::Allow;
    }
    Decision::required(
        "spec.amiID",
        "spec.amiID is required if owner's spec.version is not set",
    )
}

/// Validate a PlacementRequest against the InfrastructureDescriptor it references.
pub fn validate_placement(request: &PlacementRequest, descriptor: &InfrastructureDescriptor) -> Decision {
    if image_source_specified(request.spec.version.as_deref(), descriptor.spec.ami_id.as_deref()) {
        return Decision::Allow;
    }
    Decision::required(
        "spec.version",
        "spec.version is required if spec.amiID is not set",
    )
}
