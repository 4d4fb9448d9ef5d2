use url::Url;

/// Extracts the site identity from a URL
///
/// The host is lowercased and a leading `www.` is dropped, so
/// `https://www.example.com` and `https://example.com` belong to the same site.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use course_ripple::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/course/x").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => host,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_drops_www() {
        let url = Url::parse("https://www.example.com/course/x").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_keeps_other_subdomains() {
        let url = Url::parse("https://api.example.com/v1").unwrap();
        assert_eq!(extract_domain(&url), Some("api.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://EXAMPLE.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }
}
