//! URI utilities.

use camino::Utf8Path;
use http::uri::PathAndQuery;
use http::Uri;
use url::Url;

/// Extension trait for URIs.
pub trait UriExtension {
    /// Join a path to a URI.
    ///
    /// Fails when the joined path is not a valid URI path, e.g. it contains
    /// spaces.
    fn join<P: AsRef<str>>(self, path: P) -> Result<Uri, http::Error>;

    /// Replace a query parameter in a URI.
    fn replace_query(self, key: &str, value: &str) -> Uri;

    /// Read the first value of a query parameter.
    fn query_value(&self, key: &str) -> Option<String>;
}

impl UriExtension for Uri {
    fn join<P: AsRef<str>>(self, path: P) -> Result<Uri, http::Error> {
        let mut parts = self.into_parts();

        if let Some(pq) = parts.path_and_query.as_ref() {
            let joined = Utf8Path::new(pq.path()).join(path.as_ref());
            parts.path_and_query = Some(PathAndQuery::from_maybe_shared(joined.into_string())?);
        }
        Ok(Uri::from_parts(parts)?)
    }

    fn replace_query(self, key: &str, value: &str) -> Uri {
        let mut url = Url::parse(&self.to_string()).expect("valid url");

        let current = url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect::<Vec<_>>();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(current)
            .append_pair(key, value);

        url.to_string().parse().expect("valid uri")
    }

    fn query_value(&self, key: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_uri_join() {
        let uri = "https://api.github.com/".parse::<Uri>().unwrap();
        assert_eq!(
            uri.join("orgs/acme/repos").unwrap().to_string(),
            "https://api.github.com/orgs/acme/repos"
        );

        let uri = "http://example.com/bar".parse::<Uri>().unwrap();
        assert_eq!(uri.join("foo").unwrap().to_string(), "http://example.com/bar/foo");

        let uri = "http://example.com/bar/".parse::<Uri>().unwrap();
        assert_eq!(uri.join("/foo").unwrap().to_string(), "http://example.com/foo");
    }

    #[test]
    fn test_uri_join_empty() {
        let uri = "http://example.com".parse::<Uri>().unwrap();
        assert_eq!(uri.join("").unwrap().to_string(), "http://example.com/");
    }

    #[test]
    fn test_uri_join_invalid_path() {
        let uri = "https://api.github.com/".parse::<Uri>().unwrap();
        assert!(uri.join("orgs/acme corp/repos").is_err());
    }

    #[test]
    fn replace_query_keeps_other_pairs() {
        let uri = "https://api.github.com/orgs/acme/repos?per_page=10&page=1"
            .parse::<Uri>()
            .unwrap();

        let next = uri.replace_query("page", "2");
        assert_eq!(
            next.to_string(),
            "https://api.github.com/orgs/acme/repos?per_page=10&page=2"
        );
    }

    #[test]
    fn query_value_reads_pairs() {
        let uri = "https://api.github.com/orgs/acme/repos?per_page=10&page=3"
            .parse::<Uri>()
            .unwrap();
        assert_eq!(uri.query_value("page").as_deref(), Some("3"));
        assert_eq!(uri.query_value("missing"), None);

        let bare = "https://api.github.com/".parse::<Uri>().unwrap();
        assert_eq!(bare.query_value("page"), None);
    }
}
