//! InfrastructureDescriptor admission scenarios.

use std::sync::Arc;

use crate::common::fixtures::{InfrastructureDescriptorBuilder, PlacementRequestBuilder};
use crate::common::memory_store::MemoryStore;
use crate::engine;
use placement_admission::webhooks::{Admission, AdmissionOperation, Decision, DenialReason};

// ============================================================================
// Create
// ============================================================================

/// Neither the owner's version nor the descriptor's image is set.
#[tokio::test]
async fn test_create_without_image_source_denied() {
    let store = Arc::new(MemoryStore::new());
    store.insert("default", "worker-0", PlacementRequestBuilder::new("worker-0").build());

    let descriptor = InfrastructureDescriptorBuilder::new("worker-0")
        .owner("worker-0")
        .build();
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Create(&descriptor),
        ))
        .await;

    let Decision::Deny(denial) = &decision else {
        panic!("expected denial, got {decision:?}");
    };
    assert_eq!(denial.reason, DenialReason::Required);
    assert_eq!(denial.field, "spec.amiID");
    assert_eq!(
        denial.message,
        "spec.amiID is required if owner's spec.version is not set"
    );
    assert_eq!(store.fetches(), 1);
}

/// The owner does not exist yet.
#[tokio::test]
async fn test_create_owner_not_found_allowed() {
    let store = Arc::new(MemoryStore::new());

    let descriptor = InfrastructureDescriptorBuilder::new("worker-0")
        .owner("worker-0")
        .build();
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Create(&descriptor),
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
    assert_eq!(store.fetches(), 1);
}

#[tokio::test]
async fn test_create_with_owner_version_allowed() {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        "default",
        "worker-0",
        PlacementRequestBuilder::new("worker-0")
            .version("v1.32.1")
            .build(),
    );

    let descriptor = InfrastructureDescriptorBuilder::new("worker-0")
        .owner("worker-0")
        .build();
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Create(&descriptor),
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_create_with_ami_allowed() {
    let store = Arc::new(MemoryStore::new());
    store.insert("default", "worker-0", PlacementRequestBuilder::new("worker-0").build());

    let descriptor = InfrastructureDescriptorBuilder::new("worker-0")
        .owner("worker-0")
        .ami_id("ami-0123456789abcdef0")
        .build();
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Create(&descriptor),
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_create_without_owner_reference_allowed_without_lookup() {
    let store = Arc::new(MemoryStore::new());

    let descriptor = InfrastructureDescriptorBuilder::new("worker-0").build();
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Create(&descriptor),
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn test_create_resolves_owner_in_descriptor_namespace() {
    let store = Arc::new(MemoryStore::new());
    // Same name, other namespace: must not be found
    store.insert("other", "worker-0", PlacementRequestBuilder::new("worker-0").build());

    let descriptor = InfrastructureDescriptorBuilder::new("worker-0")
        .namespace(Some("team-a"))
        .owner("worker-0")
        .build();
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Create(&descriptor),
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
}

// ============================================================================
// Update
// ============================================================================

/// Only providerID changes.
#[tokio::test]
async fn test_update_provider_id_change_allowed() {
    let store = Arc::new(MemoryStore::new());
    let old = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .provider_id("p1")
        .build();
    let new = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .provider_id("p2")
        .build();

    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Update {
                old: &old,
                new: &new,
            },
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
}

/// The image id changes.
#[tokio::test]
async fn test_update_ami_change_denied() {
    let store = Arc::new(MemoryStore::new());
    let old = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .build();
    let new = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-2")
        .build();

    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Update {
                old: &old,
                new: &new,
            },
        ))
        .await;

    let Decision::Deny(denial) = &decision else {
        panic!("expected denial, got {decision:?}");
    };
    assert_eq!(denial.reason, DenialReason::Forbidden);
    assert_eq!(denial.message, "spec cannot be modified");
}

#[tokio::test]
async fn test_update_tags_and_security_groups_allowed() {
    let store = Arc::new(MemoryStore::new());
    let old = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .tag("team", "storage")
        .build();
    let new = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .tag("team", "compute")
        .tag("cost-center", "42")
        .security_group("sg-0a1b2c")
        .build();

    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Update {
                old: &old,
                new: &new,
            },
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_update_instance_type_denied_even_with_mutable_changes() {
    let store = Arc::new(MemoryStore::new());
    let old = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .build();
    let new = InfrastructureDescriptorBuilder::new("worker-0")
        .ami_id("ami-1")
        .provider_id("aws:///us-east-1a/i-0abc")
        .instance_type("m5.xlarge")
        .build();

    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Update {
                old: &old,
                new: &new,
            },
        ))
        .await;

    assert!(matches!(decision, Decision::Deny(_)));
}

/// Updates are not re-checked against the owner, and never hit the store.
#[tokio::test]
async fn test_update_skips_owner_lookup() {
    let store = Arc::new(MemoryStore::new());
    store.insert("default", "worker-0", PlacementRequestBuilder::new("worker-0").build());

    let old = InfrastructureDescriptorBuilder::new("worker-0")
        .owner("worker-0")
        .build();
    let new = InfrastructureDescriptorBuilder::new("worker-0")
        .owner("worker-0")
        .provider_id("p1")
        .build();

    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(
            AdmissionOperation::Update {
                old: &old,
                new: &new,
            },
        ))
        .await;

    assert_eq!(decision, Decision::Allow);
    assert_eq!(store.fetches(), 0);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_always_allowed() {
    let store = Arc::new(MemoryStore::new());
    let decision = engine(&store)
        .evaluate(Admission::InfrastructureDescriptor(AdmissionOperation::Delete))
        .await;

    assert_eq!(decision, Decision::Allow);
    assert_eq!(store.fetches(), 0);
}
