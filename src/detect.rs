//! EC2 detection and metadata collection.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::client::{HttpMethod, ImdsClient, DEFAULT_TIMEOUT};
use crate::error::ImdsError;
use crate::field::{MetadataField, META_DATA_PATH};
use crate::version::ImdsVersion;

/// IMDSv2 token endpoint path.
const TOKEN_PATH: &str = "/latest/api/token";

/// Token TTL header name.
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

/// Token lifetime requested from the service, in seconds.
const TOKEN_TTL_SECONDS: &str = "21600";

/// Token header name for requests.
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// Metadata keyed by field, in fixed field order.
pub type Metadata = BTreeMap<MetadataField, String>;

/// Knobs for a single detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// Bound applied to each individual request.
    pub timeout: Duration,
    /// Also collect instance metadata when EC2 is detected.
    pub verbose: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
        }
    }
}

impl DetectOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of a detection run.
///
/// Serializes with absent fields omitted, so a negative result renders as
/// `{"isEC2":false}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    #[serde(rename = "isEC2")]
    pub is_ec2: bool,

    /// Present iff `is_ec2`.
    #[serde(rename = "imdsVersion", skip_serializing_if = "Option::is_none")]
    pub imds_version: Option<ImdsVersion>,

    /// Present only for verbose runs where at least one field was read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl DetectionResult {
    /// Result for a host where neither protocol answered.
    pub fn not_ec2() -> Self {
        Self::default()
    }

    fn detected(version: ImdsVersion, metadata: Option<Metadata>) -> Self {
        Self {
            is_ec2: true,
            imds_version: Some(version),
            metadata,
        }
    }
}

/// Probes the instance metadata service.
///
/// # Example
///
/// ```ignore
/// use ec2_detect::{DetectOptions, Detector};
///
/// #[tokio::main]
/// async fn main() -> Result<(), ec2_detect::ImdsError> {
///     let detector = Detector::new()?;
///     let result = detector.detect(&DetectOptions::default().with_verbose(true)).await;
///     println!("{}", serde_json::to_string(&result)?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Detector {
    client: ImdsClient,
}

impl Detector {
    /// Create a detector targeting the well-known metadata address.
    pub fn new() -> Result<Self, ImdsError> {
        Ok(Self {
            client: ImdsClient::new()?,
        })
    }

    /// Create a detector using a custom base URL.
    ///
    /// This is primarily useful for testing with mock servers.
    pub fn with_base_url(base_url: &str) -> Result<Self, ImdsError> {
        Ok(Self {
            client: ImdsClient::with_base_url(base_url)?,
        })
    }

    /// Decide whether we are on EC2 and which IMDS version answered.
    ///
    /// Tries IMDSv2 first, then falls back to IMDSv1. Network failures
    /// only ever turn into a negative result; this never errors.
    pub async fn detect(&self, options: &DetectOptions) -> DetectionResult {
        let Some(version) = self.negotiate(options.timeout).await else {
            debug!("no metadata service answered, not on EC2");
            return DetectionResult::not_ec2();
        };
        debug!(%version, "metadata service detected");

        let metadata = if options.verbose {
            self.metadata(options.timeout).await
        } else {
            None
        };

        DetectionResult::detected(version, metadata)
    }

    /// Collect the fixed metadata fields, skipping any that fail.
    ///
    /// A fresh token is requested first; without one the reads go out
    /// unauthenticated. Returns `None` when no field could be read.
    pub async fn metadata(&self, timeout: Duration) -> Option<Metadata> {
        let token = self.acquire_token(timeout).await;
        let headers = token_headers(token.as_deref());

        let mut metadata = Metadata::new();
        for field in MetadataField::ALL {
            match self
                .client
                .request(&field.path(), timeout, &headers, HttpMethod::Get)
                .await
            {
                Ok(response) if response.is_ok() => {
                    metadata.insert(field, response.body);
                }
                Ok(response) => debug!(%field, status = response.status, "field unavailable"),
                Err(e) => debug!(%field, error = %e, "field request failed"),
            }
        }

        (!metadata.is_empty()).then_some(metadata)
    }

    async fn negotiate(&self, timeout: Duration) -> Option<ImdsVersion> {
        if let Some(token) = self.acquire_token(timeout).await {
            if self.probe_root(timeout, Some(token.as_str())).await {
                return Some(ImdsVersion::V2);
            }
            debug!("token accepted but tokened listing failed, trying IMDSv1");
        }

        if self.probe_root(timeout, None).await {
            return Some(ImdsVersion::V1);
        }

        None
    }

    /// Best-effort IMDSv2 token request. Anything but a 200 with a
    /// non-empty body yields `None`.
    async fn acquire_token(&self, timeout: Duration) -> Option<String> {
        let headers = [(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS)];
        match self
            .client
            .request(TOKEN_PATH, timeout, &headers, HttpMethod::Put)
            .await
        {
            Ok(response) if response.is_ok() && !response.body.is_empty() => Some(response.body),
            Ok(response) => {
                debug!(status = response.status, "token request rejected");
                None
            }
            Err(e) => {
                debug!(error = %e, "token request failed");
                None
            }
        }
    }

    async fn probe_root(&self, timeout: Duration, token: Option<&str>) -> bool {
        let headers = token_headers(token);
        match self
            .client
            .request(META_DATA_PATH, timeout, &headers, HttpMethod::Get)
            .await
        {
            Ok(response) => response.is_ok(),
            Err(e) => {
                debug!(error = %e, tokened = token.is_some(), "metadata listing failed");
                false
            }
        }
    }
}

fn token_headers(token: Option<&str>) -> Vec<(&'static str, &str)> {
    token
        .map(|token| vec![(TOKEN_HEADER, token)])
        .unwrap_or_default()
}

/// Run detection against the real metadata service.
///
/// The error arm only covers building the HTTP client.
pub async fn detect(options: &DetectOptions) -> Result<DetectionResult, ImdsError> {
    Ok(Detector::new()?.detect(options).await)
}

/// Collect instance metadata without deciding the protocol version first.
pub async fn metadata(timeout: Duration) -> Result<Option<Metadata>, ImdsError> {
    Ok(Detector::new()?.metadata(timeout).await)
}
