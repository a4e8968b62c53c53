//! IMDS protocol version.

use std::fmt;

use serde::Serialize;

/// Metadata service protocol that answered the detection probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImdsVersion {
    /// Unauthenticated GET access.
    #[serde(rename = "v1")]
    V1,
    /// Session-token access.
    #[serde(rename = "v2")]
    V2,
}

impl ImdsVersion {
    /// Short name as used in output, `v1` or `v2`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImdsVersion::V1 => "v1",
            ImdsVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for ImdsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
