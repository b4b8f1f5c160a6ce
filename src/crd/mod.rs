//! Custom Resource Definitions (CRDs) validated by placement-admission.
//!
//! - `PlacementRequest`: generic workload placement, referencing its infrastructure
//! - `InfrastructureDescriptor`: cloud-specific compute provisioning

mod infrastructure_descriptor;
mod placement_request;

pub use infrastructure_descriptor::*;
pub use placement_request::*;
