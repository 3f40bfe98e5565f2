use std::collections::HashMap;

use serde_json::Value;

use crate::config::SiteConfig;
use crate::domain::split_domain;
use crate::errors::{Error, Result};
use crate::resources::acm::{Certificate, DomainValidationOption};
use crate::resources::cloudfront::{
    CustomErrorResponse, DefaultCacheBehavior, Distribution, DistributionConfig, Logging, Origin,
    OriginAccessIdentity, OriginAccessIdentityConfig, Restrictions, S3OriginConfig,
    ViewerCertificate,
};
use crate::resources::route53::RecordSet;
use crate::resources::s3::{
    Bucket, BucketPolicy, OwnershipControls, OwnershipControlsRule,
    PublicAccessBlockConfiguration, WebsiteConfiguration, policy_doc,
};
use crate::stack::{
    get_att, get_ref, logical_id, resources_to_template, sub, Resource, ResourceOutput,
    SavedTemplate,
};

/// CloudFront access logs are cached for ten minutes; the distribution
/// pins min, default, and max TTL to the same window.
const TEN_MINUTES: u64 = 60 * 10;

/// Output keys surfaced from the deployed stack.
pub mod outputs {
    pub const CONTENT_BUCKET_NAME: &str = "ContentBucketName";
    pub const CONTENT_BUCKET_URI: &str = "ContentBucketUri";
    pub const CONTENT_BUCKET_WEBSITE_ENDPOINT: &str = "ContentBucketWebsiteEndpoint";
    pub const TARGET_DOMAIN_ENDPOINT: &str = "TargetDomainEndpoint";
    pub const CDN_DOMAIN_NAME: &str = "CdnDomainName";
    pub const CERTIFICATE_ARN: &str = "CertificateArn";
}

/// Build the full stack template for one deployment.
///
/// This is a pure function from desired state to a template; nothing here
/// talks to AWS. `hosted_zone_id` is the id of the zone that holds the
/// parent domain, required only when a certificate has to be declared
/// (the engine writes the DNS validation records into that zone). In
/// staging mode the zone is never consulted.
pub fn build_template(config: &SiteConfig, hosted_zone_id: Option<&str>) -> Result<SavedTemplate> {
    config.validate()?;

    let mut resources = Vec::new();
    let mut stack_outputs = HashMap::new();

    let content_bucket = add_site_buckets(config, &mut resources);
    let logs_bucket = logical_id("logsbucket", &config.project_name);

    stack_outputs.insert(
        outputs::CONTENT_BUCKET_NAME.to_string(),
        ResourceOutput {
            description: "Name of the bucket holding the site contents".to_string(),
            value: get_ref(&content_bucket),
        },
    );
    stack_outputs.insert(
        outputs::CONTENT_BUCKET_URI.to_string(),
        ResourceOutput {
            description: "S3 URI of the content bucket".to_string(),
            value: sub(&format!("s3://${{{content_bucket}}}")),
        },
    );
    stack_outputs.insert(
        outputs::CONTENT_BUCKET_WEBSITE_ENDPOINT.to_string(),
        ResourceOutput {
            description: "Website endpoint of the content bucket".to_string(),
            value: get_att(&content_bucket, "WebsiteURL"),
        },
    );

    if config.is_staging() {
        add_public_access(config, &content_bucket, &mut resources);
        stack_outputs.insert(
            outputs::TARGET_DOMAIN_ENDPOINT.to_string(),
            ResourceOutput {
                description: "URL the site is reachable at".to_string(),
                value: get_att(&content_bucket, "WebsiteURL"),
            },
        );
        return resources_to_template(resources, stack_outputs);
    }

    // custom domain: private bucket behind a CDN
    let oai = add_origin_access_identity(config, &mut resources);
    add_cdn_bucket_policy(config, &content_bucket, &oai, &mut resources);

    let certificate = match &config.certificate_arn {
        Some(arn) => CertificateSource::Supplied(arn.clone()),
        None => {
            let zone_id = hosted_zone_id.ok_or_else(|| {
                Error::InvalidConfig(
                    "a hosted zone id is required to create a DNS-validated certificate"
                        .to_string(),
                )
            })?;
            CertificateSource::Declared(add_certificate(config, zone_id, &mut resources)?)
        }
    };

    let cdn = add_distribution(
        config,
        &content_bucket,
        &logs_bucket,
        &oai,
        &certificate,
        &mut resources,
    );
    add_alias_records(config, &cdn, &mut resources)?;

    stack_outputs.insert(
        outputs::TARGET_DOMAIN_ENDPOINT.to_string(),
        ResourceOutput {
            description: "URL the site is reachable at".to_string(),
            value: Value::String(format!("https://{}/", config.target_domain)),
        },
    );
    stack_outputs.insert(
        outputs::CDN_DOMAIN_NAME.to_string(),
        ResourceOutput {
            description: "Domain name of the CloudFront distribution".to_string(),
            value: get_att(&cdn, "DomainName"),
        },
    );
    stack_outputs.insert(
        outputs::CERTIFICATE_ARN.to_string(),
        ResourceOutput {
            description: "ACM certificate the distribution serves with".to_string(),
            value: certificate.arn_value(),
        },
    );

    resources_to_template(resources, stack_outputs)
}

/// The distribution references exactly one certificate source: an ARN the
/// operator supplied, or the certificate resource declared in this stack.
enum CertificateSource {
    Supplied(String),
    Declared(String),
}

impl CertificateSource {
    fn arn_value(&self) -> Value {
        match self {
            CertificateSource::Supplied(arn) => Value::String(arn.clone()),
            CertificateSource::Declared(logical) => get_ref(logical),
        }
    }
}

/// Content bucket (configured as a static website) and the logs bucket
/// the CDN writes request logs into. Returns the content bucket's logical
/// id; the logs bucket id is derivable from the project name.
fn add_site_buckets(config: &SiteConfig, resources: &mut Vec<Resource>) -> String {
    let content_name = logical_id("contentbucket", &config.project_name);
    let content_bucket = Bucket {
        website_configuration: Some(WebsiteConfiguration {
            index_document: config.index_document.clone(),
            error_document: config.error_document.clone(),
        }),
        ..Default::default()
    };
    resources.push(Resource::new(content_name.clone(), content_bucket));

    // request logs stay private; CloudFront delivers them via ACL, so the
    // bucket keeps object ACLs enabled
    let logs_name = logical_id("logsbucket", &config.project_name);
    let logs_bucket = Bucket {
        access_control: Some("Private".to_string()),
        ownership_controls: Some(OwnershipControls {
            rules: vec![OwnershipControlsRule {
                object_ownership: "ObjectWriter".to_string(),
            }],
        }),
        ..Default::default()
    };
    resources.push(Resource::new(logs_name, logs_bucket));

    content_name
}

/// Public mode: object-level ACLs allowed, public-access block relaxed.
/// Asset uploads then carry a public-read ACL; no bucket policy exists.
fn add_public_access(config: &SiteConfig, content_bucket: &str, resources: &mut Vec<Resource>) {
    // ownership controls and the public-access block live on the bucket
    // resource itself in CloudFormation, so amend the declared bucket
    // rather than adding standalone resources
    if let Some(resource) = resources.iter_mut().find(|r| r.name == content_bucket) {
        let patched = Bucket {
            website_configuration: Some(WebsiteConfiguration {
                index_document: config.index_document.clone(),
                error_document: config.error_document.clone(),
            }),
            ownership_controls: Some(OwnershipControls {
                rules: vec![OwnershipControlsRule {
                    object_ownership: "ObjectWriter".to_string(),
                }],
            }),
            public_access_block_configuration: Some(PublicAccessBlockConfiguration {
                block_public_acls: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        resource.properties = Box::new(patched);
    }
}

fn add_origin_access_identity(config: &SiteConfig, resources: &mut Vec<Resource>) -> String {
    let name = logical_id("originaccessidentity", &config.project_name);
    let oai = OriginAccessIdentity {
        config: OriginAccessIdentityConfig {
            comment: format!("access identity for {}", config.target_domain),
        },
    };
    resources.push(Resource::new(name.clone(), oai));
    name
}

/// CDN-gated mode: only the origin access identity may read objects.
fn add_cdn_bucket_policy(
    config: &SiteConfig,
    content_bucket: &str,
    oai: &str,
    resources: &mut Vec<Resource>,
) {
    let name = logical_id("bucketpolicy", &config.project_name);
    let principal = serde_json::json!({
        "AWS": sub(&format!(
            "arn:aws:iam::cloudfront:user/CloudFront Origin Access Identity ${{{oai}}}"
        )),
    });
    let policy = BucketPolicy {
        bucket: get_ref(content_bucket),
        policy_document: policy_doc(
            "Allow",
            &["s3:GetObject"],
            principal,
            sub(&format!("arn:aws:s3:::${{{content_bucket}}}/*")),
        ),
    };
    resources.push(Resource::new(name, policy));
}

/// Request a DNS-validated certificate for the target domain, covering
/// `www.<domain>` as well when asked for and the domain has no existing
/// subdomain. One validation option per covered name; the engine writes
/// the validation records and holds the stack until ISSUED.
fn add_certificate(
    config: &SiteConfig,
    hosted_zone_id: &str,
    resources: &mut Vec<Resource>,
) -> Result<String> {
    let parts = split_domain(&config.target_domain)?;
    let name = logical_id("certificate", &config.project_name);

    let mut covered = vec![config.target_domain.clone()];
    let mut subject_alternative_names = Vec::new();
    if config.include_www && parts.subdomain.is_empty() {
        let www = format!("www.{}", config.target_domain);
        subject_alternative_names.push(www.clone());
        covered.push(www);
    }

    let certificate = Certificate {
        domain_name: config.target_domain.clone(),
        subject_alternative_names,
        validation_method: "DNS".to_string(),
        domain_validation_options: covered
            .into_iter()
            .map(|domain_name| DomainValidationOption {
                domain_name,
                hosted_zone_id: Value::String(hosted_zone_id.to_string()),
            })
            .collect(),
    };
    resources.push(Resource::new(name.clone(), certificate));
    Ok(name)
}

fn add_distribution(
    config: &SiteConfig,
    content_bucket: &str,
    logs_bucket: &str,
    oai: &str,
    certificate: &CertificateSource,
    resources: &mut Vec<Resource>,
) -> String {
    let name = logical_id("cdn", &config.project_name);
    let origin_id = "origin0";

    let mut aliases = vec![config.target_domain.clone()];
    if config.include_www {
        aliases.push(format!("www.{}", config.target_domain));
    }

    let distribution = Distribution {
        distribution_config: DistributionConfig {
            enabled: true,
            aliases,
            origins: vec![Origin {
                id: origin_id.to_string(),
                domain_name: get_att(content_bucket, "RegionalDomainName"),
                s3_origin_config: Some(S3OriginConfig {
                    origin_access_identity: sub(&format!(
                        "origin-access-identity/cloudfront/${{{oai}}}"
                    )),
                }),
            }],
            default_root_object: Some(config.index_document.clone()),
            default_cache_behavior: DefaultCacheBehavior {
                target_origin_id: origin_id.to_string(),
                min_ttl: TEN_MINUTES,
                default_ttl: TEN_MINUTES,
                max_ttl: TEN_MINUTES,
                ..Default::default()
            },
            price_class: Some("PriceClass_100".to_string()),
            custom_error_responses: vec![CustomErrorResponse {
                error_code: 404,
                response_code: 404,
                response_page_path: format!("/{}", config.error_document),
            }],
            restrictions: Some(Restrictions::default()),
            viewer_certificate: Some(ViewerCertificate::acm(certificate.arn_value())),
            logging: Some(Logging {
                bucket: get_att(logs_bucket, "DomainName"),
                include_cookies: false,
                prefix: format!("{}/", config.target_domain),
            }),
        },
    };

    let mut resource = Resource::new(name.clone(), distribution);
    if let CertificateSource::Declared(cert_logical) = certificate {
        // the certificate must reach ISSUED before the distribution can
        // reference it
        resource = resource.depends_on(cert_logical.clone());
    }
    resources.push(resource);
    name
}

/// Alias record(s) pointing the domain at the distribution: one for the
/// apex, and one for `www` when requested. The GetAtt reference gives the
/// engine the distribution-before-record ordering edge.
fn add_alias_records(config: &SiteConfig, cdn: &str, resources: &mut Vec<Resource>) -> Result<()> {
    let parts = split_domain(&config.target_domain)?;
    let mut zone_name = parts.parent_domain.clone();
    if !zone_name.ends_with('.') {
        zone_name.push('.');
    }

    let apex = logical_id("aliasrecord", &config.project_name);
    resources.push(Resource::new(
        apex,
        RecordSet::cloudfront_alias(&config.target_domain, &zone_name, get_att(cdn, "DomainName")),
    ));

    if config.include_www {
        let www = logical_id("wwwaliasrecord", &config.project_name);
        resources.push(Resource::new(
            www,
            RecordSet::cloudfront_alias(
                &format!("www.{}", config.target_domain),
                &zone_name,
                get_att(cdn, "DomainName"),
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging_config() -> SiteConfig {
        SiteConfig::default()
    }

    fn domain_config() -> SiteConfig {
        SiteConfig {
            target_domain: "example.com".to_string(),
            ..Default::default()
        }
    }

    fn resources_of_type(template: &SavedTemplate, ty: &str) -> Vec<String> {
        template
            .resources
            .iter()
            .filter(|(_, r)| r.ty == ty)
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[test]
    fn staging_mode_is_public_and_has_no_cdn() {
        let template = build_template(&staging_config(), None).unwrap();
        assert_eq!(resources_of_type(&template, "AWS::S3::Bucket").len(), 2);
        assert!(resources_of_type(&template, "AWS::S3::BucketPolicy").is_empty());
        assert!(resources_of_type(&template, "AWS::CloudFront::Distribution").is_empty());
        assert!(resources_of_type(&template, "AWS::CertificateManager::Certificate").is_empty());
        assert!(resources_of_type(&template, "AWS::Route53::RecordSet").is_empty());

        let content = &template.resources["contentbucketstaticwebcdn"];
        let props = &content.properties;
        assert_eq!(
            props["PublicAccessBlockConfiguration"]["BlockPublicAcls"],
            false
        );
        assert_eq!(
            props["OwnershipControls"]["Rules"][0]["ObjectOwnership"],
            "ObjectWriter"
        );
    }

    #[test]
    fn domain_mode_gates_the_bucket_behind_the_cdn() {
        let template = build_template(&domain_config(), Some("Z123")).unwrap();
        assert_eq!(resources_of_type(&template, "AWS::S3::BucketPolicy").len(), 1);
        assert_eq!(
            resources_of_type(&template, "AWS::CloudFront::Distribution").len(),
            1
        );
        assert_eq!(
            resources_of_type(
                &template,
                "AWS::CloudFront::CloudFrontOriginAccessIdentity"
            )
            .len(),
            1
        );

        // the two access models never coexist: no public access block is
        // relaxed in domain mode
        let content = &template.resources["contentbucketstaticwebcdn"];
        assert!(content
            .properties
            .get("PublicAccessBlockConfiguration")
            .is_none());

        // policy grants GetObject to the OAI principal only
        let policy = &template.resources["bucketpolicystaticwebcdn"].properties;
        let statement = &policy["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert!(statement["Principal"]["AWS"]["Fn::Sub"]
            .as_str()
            .unwrap()
            .contains("CloudFront Origin Access Identity"));
    }

    #[test]
    fn include_www_adds_exactly_one_san_and_a_second_alias() {
        let config = SiteConfig {
            include_www: true,
            ..domain_config()
        };
        let template = build_template(&config, Some("Z123")).unwrap();

        let cert = &template.resources["certificatestaticwebcdn"].properties;
        let sans = cert["SubjectAlternativeNames"].as_array().unwrap();
        assert_eq!(sans.len(), 1);
        assert_eq!(sans[0], "www.example.com");
        // one validation option per covered name
        assert_eq!(cert["DomainValidationOptions"].as_array().unwrap().len(), 2);

        let records = resources_of_type(&template, "AWS::Route53::RecordSet");
        assert_eq!(records.len(), 2);

        let cdn = &template.resources["cdnstaticwebcdn"].properties;
        let aliases = cdn["DistributionConfig"]["Aliases"].as_array().unwrap();
        assert_eq!(
            aliases,
            &vec![
                serde_json::json!("example.com"),
                serde_json::json!("www.example.com")
            ]
        );
    }

    #[test]
    fn without_www_only_the_apex_is_covered() {
        let template = build_template(&domain_config(), Some("Z123")).unwrap();
        let cert = &template.resources["certificatestaticwebcdn"].properties;
        assert!(cert.get("SubjectAlternativeNames").is_none());
        assert_eq!(cert["DomainValidationOptions"].as_array().unwrap().len(), 1);
        assert_eq!(
            resources_of_type(&template, "AWS::Route53::RecordSet").len(),
            1
        );
    }

    #[test]
    fn www_is_not_added_when_the_domain_already_has_a_subdomain() {
        let config = SiteConfig {
            target_domain: "app.example.com".to_string(),
            include_www: true,
            ..Default::default()
        };
        let template = build_template(&config, Some("Z123")).unwrap();
        let cert = &template.resources["certificatestaticwebcdn"].properties;
        assert!(cert.get("SubjectAlternativeNames").is_none());
        // the distribution alias list still honors include_www
        let records = resources_of_type(&template, "AWS::Route53::RecordSet");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn supplied_certificate_arn_skips_certificate_creation() {
        let arn = "arn:aws:acm:us-east-1:123456789012:certificate/abc";
        let config = SiteConfig {
            certificate_arn: Some(arn.to_string()),
            ..domain_config()
        };
        // no hosted zone id needed when the certificate already exists
        let template = build_template(&config, None).unwrap();
        assert!(resources_of_type(&template, "AWS::CertificateManager::Certificate").is_empty());

        let cdn = &template.resources["cdnstaticwebcdn"];
        assert!(cdn.depends_on.is_empty());
        assert_eq!(
            cdn.properties["DistributionConfig"]["ViewerCertificate"]["AcmCertificateArn"],
            arn
        );
        assert_eq!(template.outputs[outputs::CERTIFICATE_ARN].value, arn);
    }

    #[test]
    fn declared_certificate_gates_the_distribution() {
        let template = build_template(&domain_config(), Some("Z123")).unwrap();
        let cdn = &template.resources["cdnstaticwebcdn"];
        assert_eq!(cdn.depends_on, vec!["certificatestaticwebcdn".to_string()]);
        assert_eq!(
            cdn.properties["DistributionConfig"]["ViewerCertificate"]["AcmCertificateArn"]["Ref"],
            "certificatestaticwebcdn"
        );
    }

    #[test]
    fn distribution_pins_the_ttl_window() {
        let template = build_template(&domain_config(), Some("Z123")).unwrap();
        let behavior =
            &template.resources["cdnstaticwebcdn"].properties["DistributionConfig"]["DefaultCacheBehavior"];
        assert_eq!(behavior["MinTTL"], 600);
        assert_eq!(behavior["DefaultTTL"], 600);
        assert_eq!(behavior["MaxTTL"], 600);
        assert_eq!(behavior["ViewerProtocolPolicy"], "redirect-to-https");
    }

    #[test]
    fn missing_zone_id_is_rejected_before_deploy() {
        let err = build_template(&domain_config(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn staging_outputs_point_at_the_bucket_website() {
        let template = build_template(&staging_config(), None).unwrap();
        let endpoint = &template.outputs[outputs::TARGET_DOMAIN_ENDPOINT].value;
        assert_eq!(endpoint["Fn::GetAtt"][1], "WebsiteURL");
        assert!(template.outputs.get(outputs::CDN_DOMAIN_NAME).is_none());
    }

    #[test]
    fn domain_outputs_point_at_the_domain() {
        let template = build_template(&domain_config(), Some("Z123")).unwrap();
        assert_eq!(
            template.outputs[outputs::TARGET_DOMAIN_ENDPOINT].value,
            "https://example.com/"
        );
        assert_eq!(
            template.outputs[outputs::CDN_DOMAIN_NAME].value["Fn::GetAtt"][0],
            "cdnstaticwebcdn"
        );
    }
}
