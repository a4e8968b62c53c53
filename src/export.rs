//! Environment-variable and shell export of detection results.
//!
//! Naming is pure: [`EnvExport::vars`] maps a [`DetectionResult`] onto
//! `(name, value)` pairs, and only [`EnvExport::apply`] touches the
//! process environment.

use std::collections::HashMap;

use crate::detect::DetectionResult;
use crate::field::MetadataField;

/// Default variable name prefix.
pub const DEFAULT_PREFIX: &str = "EC2_";

/// Override key for the EC2 flag.
pub const IS_EC2_KEY: &str = "isEC2";

/// Override key for the protocol version.
pub const IMDS_VERSION_KEY: &str = "imdsVersion";

/// Whether `key` names an exported value: `isEC2`, `imdsVersion`, or a
/// metadata field such as `instance-id`.
pub fn is_override_key(key: &str) -> bool {
    key == IS_EC2_KEY || key == IMDS_VERSION_KEY || MetadataField::from_name(key).is_some()
}

/// Maps detection results onto environment variable names.
///
/// Defaults are `<prefix>IS_EC2`, `<prefix>IMDS_VERSION` and
/// `<prefix><FIELD>` with the field name upper-cased and dashes turned
/// into underscores. Overrides replace the whole name for one key.
#[derive(Debug, Clone)]
pub struct EnvExport {
    prefix: String,
    overrides: HashMap<String, String>,
}

impl Default for EnvExport {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvExport {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            overrides: HashMap::new(),
        }
    }

    /// Set the prefix used for names without an override.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use `name` verbatim for `key`.
    ///
    /// `key` is `isEC2`, `imdsVersion`, or a metadata field name such as
    /// `instance-id`.
    pub fn with_override(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), name.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Variable name for `key`.
    pub fn name_for(&self, key: &str) -> String {
        if let Some(name) = self.overrides.get(key) {
            return name.clone();
        }
        let suffix = match key {
            IS_EC2_KEY => "IS_EC2".to_string(),
            IMDS_VERSION_KEY => "IMDS_VERSION".to_string(),
            other => other.to_ascii_uppercase().replace('-', "_"),
        };
        format!("{}{}", self.prefix, suffix)
    }

    /// Variables for `result`: the flag, then the version and metadata
    /// fields when present.
    pub fn vars(&self, result: &DetectionResult) -> Vec<(String, String)> {
        let mut vars = vec![(self.name_for(IS_EC2_KEY), result.is_ec2.to_string())];

        if let Some(version) = result.imds_version {
            vars.push((self.name_for(IMDS_VERSION_KEY), version.to_string()));
        }
        if let Some(metadata) = &result.metadata {
            for (field, value) in metadata {
                vars.push((self.name_for(field.as_str()), value.clone()));
            }
        }

        vars
    }

    /// One `export NAME='value'` line per variable.
    pub fn shell(&self, result: &DetectionResult) -> String {
        self.vars(result)
            .iter()
            .map(|(name, value)| format!("export {}={}\n", name, shell_quote(value)))
            .collect()
    }

    /// Assign the variables into the current process environment.
    ///
    /// Call this before other threads start reading the environment;
    /// `std::env::set_var` is not synchronized with concurrent readers.
    pub fn apply(&self, result: &DetectionResult) {
        for (name, value) in self.vars(result) {
            std::env::set_var(name, value);
        }
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
