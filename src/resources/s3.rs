use serde::Serialize;
use serde_json::Value;

use crate::stack::CfnResource;

/// `AWS::S3::Bucket`. When `bucket_name` is left empty we let
/// CloudFormation generate the bucket name from the logical resource name.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Bucket {
    #[serde(rename = "BucketName", skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(rename = "AccessControl", skip_serializing_if = "Option::is_none")]
    pub access_control: Option<String>,
    #[serde(rename = "WebsiteConfiguration", skip_serializing_if = "Option::is_none")]
    pub website_configuration: Option<WebsiteConfiguration>,
    #[serde(
        rename = "PublicAccessBlockConfiguration",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_access_block_configuration: Option<PublicAccessBlockConfiguration>,
    #[serde(rename = "OwnershipControls", skip_serializing_if = "Option::is_none")]
    pub ownership_controls: Option<OwnershipControls>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct WebsiteConfiguration {
    #[serde(rename = "IndexDocument")]
    pub index_document: String,
    #[serde(rename = "ErrorDocument")]
    pub error_document: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PublicAccessBlockConfiguration {
    #[serde(rename = "BlockPublicAcls", skip_serializing_if = "Option::is_none")]
    pub block_public_acls: Option<bool>,
    #[serde(rename = "BlockPublicPolicy", skip_serializing_if = "Option::is_none")]
    pub block_public_policy: Option<bool>,
    #[serde(rename = "IgnorePublicAcls", skip_serializing_if = "Option::is_none")]
    pub ignore_public_acls: Option<bool>,
    #[serde(
        rename = "RestrictPublicBuckets",
        skip_serializing_if = "Option::is_none"
    )]
    pub restrict_public_buckets: Option<bool>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct OwnershipControls {
    #[serde(rename = "Rules")]
    pub rules: Vec<OwnershipControlsRule>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct OwnershipControlsRule {
    #[serde(rename = "ObjectOwnership")]
    pub object_ownership: String,
}

impl CfnResource for Bucket {
    fn type_string(&self) -> &'static str {
        "AWS::S3::Bucket"
    }

    fn properties(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.bucket_name {
            validate_bucket_name(name)?;
        }
        Ok(())
    }
}

/// Bucket name restrictions:
/// https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html
pub fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.len() < 3 || name.len() > 63 {
        return Err(format!(
            "Invalid bucket name {name}. Must be between 3 and 63 characters"
        ));
    }
    if name.contains("..") {
        return Err(format!(
            "Invalid bucket name {name}. May not contain two consecutive dots"
        ));
    }
    for c in name.chars() {
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.') {
            return Err(format!(
                "Invalid bucket name {name}. Must only consist of lowercase letters, numbers, dots, and hyphens"
            ));
        }
    }
    let first = name.chars().next().unwrap_or(' ');
    let last = name.chars().last().unwrap_or(' ');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(format!(
            "Invalid bucket name {name}. Must begin and end with a letter or number"
        ));
    }
    Ok(())
}

/// `AWS::S3::BucketPolicy`. `bucket` is usually a `Ref` to the bucket
/// resource; the policy document is built by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct BucketPolicy {
    #[serde(rename = "Bucket")]
    pub bucket: Value,
    #[serde(rename = "PolicyDocument")]
    pub policy_document: Value,
}

impl CfnResource for BucketPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::S3::BucketPolicy"
    }

    fn properties(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        if self.policy_document.get("Statement").is_none() {
            return Err("Bucket policy document must have a Statement".to_string());
        }
        Ok(())
    }
}

/// A policy document with a single statement granting `actions` on
/// `resource` to `principal`.
pub fn policy_doc(effect: &str, actions: &[&str], principal: Value, resource: Value) -> Value {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": effect,
                "Principal": principal,
                "Action": actions,
                "Resource": [resource],
            }
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_are_checked() {
        assert!(validate_bucket_name("my-site-content").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name("something..exact").is_err());
        assert!(validate_bucket_name("HasUppercase").is_err());
        assert!(validate_bucket_name("-leading-hyphen").is_err());
    }

    #[test]
    fn website_bucket_serializes_pascal_case() {
        let bucket = Bucket {
            website_configuration: Some(WebsiteConfiguration {
                index_document: "index.html".into(),
                error_document: "error.html".into(),
            }),
            ..Default::default()
        };
        let props = bucket.properties();
        assert_eq!(props["WebsiteConfiguration"]["IndexDocument"], "index.html");
        assert_eq!(props["WebsiteConfiguration"]["ErrorDocument"], "error.html");
        assert!(props.get("BucketName").is_none());
    }

    #[test]
    fn policy_without_statement_is_invalid() {
        let policy = BucketPolicy {
            bucket: serde_json::json!({"Ref": "bucket"}),
            policy_document: serde_json::json!({"Version": "2012-10-17"}),
        };
        assert!(policy.validate().is_err());
    }
}
