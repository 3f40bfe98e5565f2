use serde::Serialize;
use serde_json::Value;

use crate::stack::CfnResource;

/// Every CloudFront distribution is aliased out of the same fixed hosted
/// zone, regardless of account:
/// https://docs.aws.amazon.com/general/latest/gr/elb.html
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// `AWS::Route53::RecordSet`. Alias records carry an `AliasTarget`
/// instead of a TTL + literal record values.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RecordSet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "HostedZoneName", skip_serializing_if = "Option::is_none")]
    pub hosted_zone_name: Option<String>,
    #[serde(rename = "HostedZoneId", skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<Value>,
    #[serde(rename = "Comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "AliasTarget", skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(rename = "ResourceRecords", skip_serializing_if = "Option::is_none")]
    pub resource_records: Option<Vec<Value>>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct AliasTarget {
    #[serde(rename = "DNSName")]
    pub dns_name: Value,
    #[serde(rename = "HostedZoneId")]
    pub hosted_zone_id: Value,
    #[serde(rename = "EvaluateTargetHealth")]
    pub evaluate_target_health: bool,
}

impl RecordSet {
    /// An A record aliasing `name` to a CloudFront distribution's domain
    /// name, placed in the zone-canonical parent zone.
    pub fn cloudfront_alias(name: &str, hosted_zone_name: &str, distribution_domain: Value) -> Self {
        Self {
            name: name.to_string(),
            record_type: "A".to_string(),
            hosted_zone_name: Some(hosted_zone_name.to_string()),
            comment: Some(name.to_string()),
            alias_target: Some(AliasTarget {
                dns_name: distribution_domain,
                hosted_zone_id: serde_json::json!(CLOUDFRONT_HOSTED_ZONE_ID),
                evaluate_target_health: true,
            }),
            ..Default::default()
        }
    }
}

impl CfnResource for RecordSet {
    fn type_string(&self) -> &'static str {
        "AWS::Route53::RecordSet"
    }

    fn properties(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err(
                "Route53 record must have a name. Example mysubdomain.mywebsite.com".to_string(),
            );
        }
        if self.hosted_zone_name.is_none() && self.hosted_zone_id.is_none() {
            return Err(format!(
                "Route53 record {} must name the hosted zone it belongs to",
                self.name
            ));
        }
        if let Some(zone) = &self.hosted_zone_name {
            // hosted zone name must end in .
            if !zone.ends_with('.') {
                return Err(format!(
                    "Hosted zone name {zone} must end with a trailing dot"
                ));
            }
        }
        if self.alias_target.is_none() && self.resource_records.is_none() {
            return Err(format!(
                "Route53 record {} must have either an alias target or resource records",
                self.name
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_record_points_at_the_distribution() {
        let record = RecordSet::cloudfront_alias(
            "example.com",
            "example.com.",
            serde_json::json!({"Fn::GetAtt": ["cdn", "DomainName"]}),
        );
        assert!(record.validate().is_ok());
        let props = record.properties();
        assert_eq!(props["Type"], "A");
        assert_eq!(props["HostedZoneName"], "example.com.");
        assert_eq!(
            props["AliasTarget"]["HostedZoneId"],
            CLOUDFRONT_HOSTED_ZONE_ID
        );
        assert_eq!(props["AliasTarget"]["EvaluateTargetHealth"], true);
    }

    #[test]
    fn zone_name_requires_trailing_dot() {
        let mut record = RecordSet::cloudfront_alias(
            "example.com",
            "example.com.",
            serde_json::json!("abc.cloudfront.net"),
        );
        record.hosted_zone_name = Some("example.com".to_string());
        assert!(record.validate().is_err());
    }
}
