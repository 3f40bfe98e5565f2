use serde::Serialize;
use serde_json::Value;

use crate::stack::CfnResource;

/// `AWS::CertificateManager::Certificate` with DNS validation.
///
/// Each `DomainValidationOption` names a covered domain and the hosted
/// zone CloudFormation should write the validation record into. The
/// engine creates those records itself and holds the stack until the
/// certificate reports ISSUED; nothing here polls.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Certificate {
    #[serde(rename = "DomainName")]
    pub domain_name: String,
    #[serde(
        rename = "SubjectAlternativeNames",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subject_alternative_names: Vec<String>,
    #[serde(rename = "ValidationMethod")]
    pub validation_method: String,
    #[serde(rename = "DomainValidationOptions")]
    pub domain_validation_options: Vec<DomainValidationOption>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct DomainValidationOption {
    #[serde(rename = "DomainName")]
    pub domain_name: String,
    #[serde(rename = "HostedZoneId")]
    pub hosted_zone_id: Value,
}

impl CfnResource for Certificate {
    fn type_string(&self) -> &'static str {
        "AWS::CertificateManager::Certificate"
    }

    fn properties(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), String> {
        validate_cert_domain(&self.domain_name)?;
        for san in &self.subject_alternative_names {
            validate_cert_domain(san)?;
        }
        if self.domain_validation_options.is_empty() {
            return Err("DNS-validated certificate must have at least one domain validation option".to_string());
        }
        Ok(())
    }
}

/// Must be fully qualified, may have 1 optional wildcard, and the wildcard
/// must be the first component, eg: "*.something.com".
fn validate_cert_domain(domain_name: &str) -> Result<(), String> {
    if domain_name.is_empty() {
        return Err("Must provide a domain name".to_string());
    }
    if domain_name.ends_with('.') {
        return Err(format!(
            "Certificate domain must not end with a dot. {domain_name} is invalid."
        ));
    }
    if domain_name.contains('*') {
        if domain_name.matches('*').count() > 1 {
            return Err(format!(
                "Must only provide 1 wildcard. {domain_name} is invalid."
            ));
        }
        if !domain_name.starts_with('*') {
            return Err(format!(
                "If using a wildcard, it must be the first component of your domain, eg: \"*.something.com\". {domain_name} is invalid."
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(domain: &str) -> Certificate {
        Certificate {
            domain_name: domain.into(),
            validation_method: "DNS".into(),
            domain_validation_options: vec![DomainValidationOption {
                domain_name: domain.into(),
                hosted_zone_id: serde_json::json!("Z000000"),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn accepts_plain_and_leading_wildcard_domains() {
        assert!(cert("mysite.com").validate().is_ok());
        assert!(cert("multiple.sub.domains.mysite.com").validate().is_ok());
        assert!(cert("*.mysite.com").validate().is_ok());
    }

    #[test]
    fn rejects_bad_wildcards_and_trailing_dots() {
        assert!(cert("*.something.*.mysite.com").validate().is_err());
        assert!(cert("something.*.mysite.com").validate().is_err());
        assert!(cert("cannotendwithdot.com.").validate().is_err());
        assert!(cert("").validate().is_err());
    }

    #[test]
    fn requires_a_validation_option() {
        let mut c = cert("mysite.com");
        c.domain_validation_options.clear();
        assert!(c.validate().is_err());
    }
}
