//! Immutability validation policy.
//!
//! Enforced on InfrastructureDescriptor UPDATE operations only.
//!
//! Once an instance is provisioned its spec is fixed, except for the fields in
//! [`MUTABLE_FIELDS`]. Fields are compared at the top level of the spec; each
//! field is compared as a whole value.
//!
//! An unset optional string and an empty string compare equal, at any depth
//! of the field's value. Collections decode to empty when absent, so absent
//! and empty collections compare equal too.

use std::collections::BTreeSet;
use std::fmt;

use super::Decision;
use crate::crd::{
    InfrastructureDescriptor, InfrastructureDescriptorSpec, SecurityGroupReference, VolumeSpec,
};

/// Top-level fields of an InfrastructureDescriptor spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecField {
    ProviderId,
    AdditionalTags,
    AdditionalSecurityGroups,
    AmiId,
    ImageLookupOrg,
    InstanceType,
    IamInstanceProfile,
    SshKeyName,
    PublicIp,
    Subnet,
    RootVolume,
}

impl SpecField {
    /// Every spec field, in declaration order.
    pub const ALL: [SpecField; 11] = [
        SpecField::ProviderId,
        SpecField::AdditionalTags,
        SpecField::AdditionalSecurityGroups,
        SpecField::AmiId,
        SpecField::ImageLookupOrg,
        SpecField::InstanceType,
        SpecField::IamInstanceProfile,
        SpecField::SshKeyName,
        SpecField::PublicIp,
        SpecField::Subnet,
        SpecField::RootVolume,
    ];

    /// Serialized field name as it appears in the resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecField::ProviderId => "providerID",
            SpecField::AdditionalTags => "additionalTags",
            SpecField::AdditionalSecurityGroups => "additionalSecurityGroups",
            SpecField::AmiId => "amiID",
            SpecField::ImageLookupOrg => "imageLookupOrg",
            SpecField::InstanceType => "instanceType",
            SpecField::IamInstanceProfile => "iamInstanceProfile",
            SpecField::SshKeyName => "sshKeyName",
            SpecField::PublicIp => "publicIP",
            SpecField::Subnet => "subnet",
            SpecField::RootVolume => "rootVolume",
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that may change after creation.
pub const MUTABLE_FIELDS: &[SpecField] = &[
    SpecField::ProviderId,
    SpecField::AdditionalTags,
    SpecField::AdditionalSecurityGroups,
];

/// Optional strings compare with unset and empty treated alike.
fn same_text(old: &Option<String>, new: &Option<String>) -> bool {
    let normalize = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);
    normalize(old) == normalize(new)
}

fn same_security_groups(old: &[SecurityGroupReference], new: &[SecurityGroupReference]) -> bool {
    old.len() == new.len()
        && old.iter().zip(new).all(|(old, new)| {
            let SecurityGroupReference { id, arn } = old;
            same_text(id, &new.id) && same_text(arn, &new.arn)
        })
}

fn same_volume(old: &Option<VolumeSpec>, new: &Option<VolumeSpec>) -> bool {
    match (old, new) {
        (None, None) => true,
        (Some(old), Some(new)) => {
            let VolumeSpec {
                size,
                volume_type,
                encrypted,
            } = old;
            *size == new.size
                && same_text(volume_type, &new.volume_type)
                && *encrypted == new.encrypted
        }
        _ => false,
    }
}

/// Per-field change flags for two specs.
fn field_changes(
    old: &InfrastructureDescriptorSpec,
    new: &InfrastructureDescriptorSpec,
) -> [(SpecField, bool); 11] {
    // No rest pattern: a new spec field must be classified here before this compiles.
    let InfrastructureDescriptorSpec {
        provider_id,
        additional_tags,
        additional_security_groups,
        ami_id,
        image_lookup_org,
        instance_type,
        iam_instance_profile,
        ssh_key_name,
        public_ip,
        subnet,
        root_volume,
    } = old;

    [
        (SpecField::ProviderId, !same_text(provider_id, &new.provider_id)),
        (SpecField::AdditionalTags, *additional_tags != new.additional_tags),
        (
            SpecField::AdditionalSecurityGroups,
            !same_security_groups(additional_security_groups, &new.additional_security_groups),
        ),
        (SpecField::AmiId, !same_text(ami_id, &new.ami_id)),
        (
            SpecField::ImageLookupOrg,
            !same_text(image_lookup_org, &new.image_lookup_org),
        ),
        (SpecField::InstanceType, *instance_type != new.instance_type),
        (
            SpecField::IamInstanceProfile,
            !same_text(iam_instance_profile, &new.iam_instance_profile),
        ),
        (SpecField::SshKeyName, !same_text(ssh_key_name, &new.ssh_key_name)),
        (SpecField::PublicIp, *public_ip != new.public_ip),
        (SpecField::Subnet, !same_text(subnet, &new.subnet)),
        (SpecField::RootVolume, !same_volume(root_volume, &new.root_volume)),
    ]
}

/// Compute the spec fields that changed between `old` and `new`, ignoring
/// every field in `mutable_allow_list`.
///
/// The result is empty iff the specs are equal once the allow-listed fields
/// are removed from both.
pub fn residual_changes(
    old: &InfrastructureDescriptorSpec,
    new: &InfrastructureDescriptorSpec,
    mutable_allow_list: &[SpecField],
) -> BTreeSet<SpecField> {
    field_changes(old, new)
        .into_iter()
        .filter(|(field, _)| !mutable_allow_list.contains(field))
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
}

/// Validate an InfrastructureDescriptor UPDATE.
pub fn validate_update(old: &InfrastructureDescriptor, new: &InfrastructureDescriptor) -> Decision {
    let changed = residual_changes(&old.spec, &new.spec, MUTABLE_FIELDS);
    if changed.is_empty() {
        return Decision::Allow;
    }

    tracing::debug!(
        fields = %changed.iter().map(SpecField::as_str).collect::<Vec<_>>().join(","),
        "Immutable spec fields changed"
    );
    Decision::forbidden("spec", "spec cannot be modified")
}
