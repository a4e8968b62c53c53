//! Detect whether the current process runs on AWS EC2.
//!
//! Detection probes the EC2 Instance Metadata Service (IMDS) at its
//! link-local address, preferring the token-based IMDSv2 protocol and
//! falling back to IMDSv1. Optionally a fixed set of instance metadata
//! fields is collected as well.
//!
//! # Features
//!
//! - IMDSv2 / IMDSv1 negotiation with a per-request timeout
//! - Partial-failure-tolerant metadata collection
//! - Export of results as environment variables or shell `export` lines
//!
//! Detection never fails for network reasons: off EC2 every probe simply
//! times out or is refused, and the result is `{"isEC2":false}`.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use ec2_detect::{DetectOptions, EnvExport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ec2_detect::ImdsError> {
//!     let options = DetectOptions::default()
//!         .with_timeout(Duration::from_millis(500))
//!         .with_verbose(true);
//!     let result = ec2_detect::detect(&options).await?;
//!
//!     if result.is_ec2 {
//!         print!("{}", EnvExport::new().shell(&result));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Requests
//!
//! | Step | Request | Success |
//! |------|---------|---------|
//! | IMDSv2 token | `PUT /latest/api/token` | 200, non-empty body |
//! | IMDSv2 probe | `GET /latest/meta-data/` with token | 200 |
//! | IMDSv1 probe | `GET /latest/meta-data/` | 200 |
//! | Field read | `GET /latest/meta-data/<field>` | 200 |

mod client;
mod detect;
mod error;
mod export;
mod field;
mod version;

pub use client::{HttpMethod, ImdsClient, ImdsResponse, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use detect::{detect, metadata, DetectOptions, DetectionResult, Detector, Metadata};
pub use error::ImdsError;
pub use export::{is_override_key, EnvExport, DEFAULT_PREFIX};
pub use field::MetadataField;
pub use version::ImdsVersion;
