//! Declare and deploy an S3-hosted static website as a CloudFormation
//! stack.
//!
//! Two deployment shapes, selected by `target_domain`:
//! - `"staging"`: a public bucket website, nothing else.
//! - a custom domain: a private bucket readable only by a CloudFront
//!   origin access identity, a DNS-validated ACM certificate (unless an
//!   ARN is supplied), the distribution, and Route53 alias records.
//!
//! Template construction is pure ([`site::build_template`]); everything
//! that talks to AWS lives in [`engine`] and [`sync`].

pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod resources;
pub mod site;
pub mod stack;
pub mod sync;

pub use config::SiteConfig;
pub use errors::{Error, Result};
