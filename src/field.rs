//! The fixed set of metadata fields collected in verbose mode.

use std::fmt;

use serde::Serialize;

/// Base path for per-field metadata reads.
pub const META_DATA_PATH: &str = "/latest/meta-data/";

/// One of the instance metadata entries reported by verbose detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataField {
    InstanceId,
    InstanceType,
    AmiId,
    LocalIpv4,
    PublicIpv4,
}

impl MetadataField {
    /// All fields, in the order they are requested.
    pub const ALL: [MetadataField; 5] = [
        MetadataField::InstanceId,
        MetadataField::InstanceType,
        MetadataField::AmiId,
        MetadataField::LocalIpv4,
        MetadataField::PublicIpv4,
    ];

    /// Name of the field on the metadata service.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::InstanceId => "instance-id",
            MetadataField::InstanceType => "instance-type",
            MetadataField::AmiId => "ami-id",
            MetadataField::LocalIpv4 => "local-ipv4",
            MetadataField::PublicIpv4 => "public-ipv4",
        }
    }

    /// Request path for this field.
    pub fn path(&self) -> String {
        format!("{}{}", META_DATA_PATH, self.as_str())
    }

    /// Look up a field by its service name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
