use crate::errors::{Error, Result};

/// A fully-qualified domain name split into its leaf label and the rest.
///
/// `parent_domain` is the name of the Route53 hosted zone the domain lives
/// in. When the input has a subdomain the parent carries a trailing dot
/// (zone-canonical form): `"www.example.com"` splits into
/// `("www", "example.com.")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    pub subdomain: String,
    pub parent_domain: String,
}

/// Split a domain name into its subdomain and parent domain names.
/// e.g. "www.example.com" => "www", "example.com.".
///
/// Fewer than two labels is an error; exactly two labels means there is no
/// subdomain and the whole input is the parent.
pub fn split_domain(domain: &str) -> Result<DomainParts> {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 {
        return Err(Error::NoTld(domain.to_string()));
    }
    if parts.len() == 2 {
        return Ok(DomainParts {
            subdomain: String::new(),
            parent_domain: domain.to_string(),
        });
    }
    let subdomain = parts[0].to_string();
    // Trailing "." to canonicalize the zone name.
    let parent_domain = format!("{}.", parts[1..].join("."));
    Ok(DomainParts {
        subdomain,
        parent_domain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_has_no_subdomain() {
        let parts = split_domain("example.com").unwrap();
        assert_eq!(parts.subdomain, "");
        assert_eq!(parts.parent_domain, "example.com");
    }

    #[test]
    fn leaf_label_becomes_subdomain() {
        let parts = split_domain("www.example.com").unwrap();
        assert_eq!(parts.subdomain, "www");
        assert_eq!(parts.parent_domain, "example.com.");
    }

    #[test]
    fn deep_subdomains_keep_remaining_labels_as_parent() {
        let parts = split_domain("a.b.example.com").unwrap();
        assert_eq!(parts.subdomain, "a");
        assert_eq!(parts.parent_domain, "b.example.com.");
    }

    #[test]
    fn single_label_is_an_error() {
        let err = split_domain("a").unwrap_err();
        assert!(matches!(err, Error::NoTld(_)));
        assert_eq!(err.to_string(), "no top-level domain found on a");
    }

    #[test]
    fn decomposition_round_trips() {
        for domain in ["example.com", "www.example.com", "a.b.c.example.com"] {
            let parts = split_domain(domain).unwrap();
            let rejoined = if parts.subdomain.is_empty() {
                parts.parent_domain.clone()
            } else {
                format!(
                    "{}.{}",
                    parts.subdomain,
                    parts.parent_domain.trim_end_matches('.')
                )
            };
            assert_eq!(rejoined, domain);
        }
    }
}
