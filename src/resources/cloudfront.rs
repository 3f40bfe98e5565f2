use serde::Serialize;
use serde_json::Value;

use crate::stack::CfnResource;

/// `AWS::CloudFront::Distribution`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Distribution {
    #[serde(rename = "DistributionConfig")]
    pub distribution_config: DistributionConfig,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct DistributionConfig {
    #[serde(rename = "Enabled")]
    pub enabled: bool,
    #[serde(rename = "Aliases", skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(rename = "Origins")]
    pub origins: Vec<Origin>,
    #[serde(rename = "DefaultRootObject", skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,
    #[serde(rename = "DefaultCacheBehavior")]
    pub default_cache_behavior: DefaultCacheBehavior,
    #[serde(rename = "PriceClass", skip_serializing_if = "Option::is_none")]
    pub price_class: Option<String>,
    #[serde(
        rename = "CustomErrorResponses",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub custom_error_responses: Vec<CustomErrorResponse>,
    #[serde(rename = "Restrictions", skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,
    #[serde(rename = "ViewerCertificate", skip_serializing_if = "Option::is_none")]
    pub viewer_certificate: Option<ViewerCertificate>,
    #[serde(rename = "Logging", skip_serializing_if = "Option::is_none")]
    pub logging: Option<Logging>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Origin {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "DomainName")]
    pub domain_name: Value,
    #[serde(rename = "S3OriginConfig", skip_serializing_if = "Option::is_none")]
    pub s3_origin_config: Option<S3OriginConfig>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct S3OriginConfig {
    #[serde(rename = "OriginAccessIdentity")]
    pub origin_access_identity: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefaultCacheBehavior {
    #[serde(rename = "TargetOriginId")]
    pub target_origin_id: String,
    #[serde(rename = "ViewerProtocolPolicy")]
    pub viewer_protocol_policy: String,
    #[serde(rename = "AllowedMethods")]
    pub allowed_methods: Vec<String>,
    #[serde(rename = "CachedMethods")]
    pub cached_methods: Vec<String>,
    #[serde(rename = "ForwardedValues")]
    pub forwarded_values: ForwardedValues,
    #[serde(rename = "MinTTL")]
    pub min_ttl: u64,
    #[serde(rename = "DefaultTTL")]
    pub default_ttl: u64,
    #[serde(rename = "MaxTTL")]
    pub max_ttl: u64,
}

impl Default for DefaultCacheBehavior {
    fn default() -> Self {
        Self {
            target_origin_id: String::new(),
            viewer_protocol_policy: "redirect-to-https".into(),
            allowed_methods: read_only_methods(),
            cached_methods: read_only_methods(),
            forwarded_values: Default::default(),
            min_ttl: 0,
            default_ttl: 0,
            max_ttl: 0,
        }
    }
}

fn read_only_methods() -> Vec<String> {
    vec!["GET".into(), "HEAD".into(), "OPTIONS".into()]
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ForwardedValues {
    #[serde(rename = "QueryString")]
    pub query_string: bool,
    #[serde(rename = "Cookies")]
    pub cookies: Cookies,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cookies {
    #[serde(rename = "Forward")]
    pub forward: String,
}

impl Default for Cookies {
    fn default() -> Self {
        Self {
            forward: "none".into(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct CustomErrorResponse {
    #[serde(rename = "ErrorCode")]
    pub error_code: u16,
    #[serde(rename = "ResponseCode")]
    pub response_code: u16,
    #[serde(rename = "ResponsePagePath")]
    pub response_page_path: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Restrictions {
    #[serde(rename = "GeoRestriction")]
    pub geo_restriction: GeoRestriction,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoRestriction {
    #[serde(rename = "RestrictionType")]
    pub restriction_type: String,
}

impl Default for GeoRestriction {
    fn default() -> Self {
        Self {
            restriction_type: "none".into(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ViewerCertificate {
    #[serde(rename = "AcmCertificateArn", skip_serializing_if = "Option::is_none")]
    pub acm_certificate_arn: Option<Value>,
    #[serde(rename = "SslSupportMethod", skip_serializing_if = "Option::is_none")]
    pub ssl_support_method: Option<String>,
    #[serde(
        rename = "MinimumProtocolVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_protocol_version: Option<String>,
    #[serde(
        rename = "CloudFrontDefaultCertificate",
        skip_serializing_if = "Option::is_none"
    )]
    pub cloudfront_default_certificate: Option<bool>,
}

impl ViewerCertificate {
    /// The standard custom-domain certificate config: SNI with a minimum
    /// of TLSv1.2_2021.
    pub fn acm(certificate_arn: Value) -> Self {
        Self {
            acm_certificate_arn: Some(certificate_arn),
            ssl_support_method: Some("sni-only".into()),
            minimum_protocol_version: Some("TLSv1.2_2021".into()),
            cloudfront_default_certificate: None,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Logging {
    #[serde(rename = "Bucket")]
    pub bucket: Value,
    #[serde(rename = "IncludeCookies")]
    pub include_cookies: bool,
    #[serde(rename = "Prefix")]
    pub prefix: String,
}

impl CfnResource for Distribution {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Distribution"
    }

    fn properties(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        let config = &self.distribution_config;
        if config.origins.is_empty() {
            return Err("Must provide at least one origin to a cloudfront distribution".to_string());
        }
        let target = &config.default_cache_behavior.target_origin_id;
        if !config.origins.iter().any(|o| o.id == *target) {
            return Err(format!(
                "Default cache behavior targets unknown origin '{target}'"
            ));
        }
        Ok(())
    }
}

/// `AWS::CloudFront::CloudFrontOriginAccessIdentity`: the principal used
/// to scope bucket reads exclusively to the distribution.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OriginAccessIdentity {
    #[serde(rename = "CloudFrontOriginAccessIdentityConfig")]
    pub config: OriginAccessIdentityConfig,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct OriginAccessIdentityConfig {
    #[serde(rename = "Comment")]
    pub comment: String,
}

impl CfnResource for OriginAccessIdentity {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::CloudFrontOriginAccessIdentity"
    }

    fn properties(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distribution_with_origin(target: &str) -> Distribution {
        Distribution {
            distribution_config: DistributionConfig {
                enabled: true,
                origins: vec![Origin {
                    id: "origin0".into(),
                    domain_name: serde_json::json!("bucket.s3.us-east-1.amazonaws.com"),
                    s3_origin_config: Some(Default::default()),
                }],
                default_cache_behavior: DefaultCacheBehavior {
                    target_origin_id: target.into(),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn behavior_must_target_a_declared_origin() {
        assert!(distribution_with_origin("origin0").validate().is_ok());
        assert!(distribution_with_origin("origin1").validate().is_err());
    }

    #[test]
    fn ttl_fields_serialize_with_cfn_names() {
        let behavior = DefaultCacheBehavior {
            target_origin_id: "origin0".into(),
            min_ttl: 600,
            default_ttl: 600,
            max_ttl: 600,
            ..Default::default()
        };
        let json = serde_json::to_value(&behavior).unwrap();
        assert_eq!(json["MinTTL"], 600);
        assert_eq!(json["DefaultTTL"], 600);
        assert_eq!(json["MaxTTL"], 600);
        assert_eq!(json["ViewerProtocolPolicy"], "redirect-to-https");
    }
}
