//! Remote reference parsing
//!
//! Remote locations are written `scheme://<namespace>/<key...>`, e.g.
//! `oss://my-bucket/confsync/cfg/nvim`. The namespace must match the
//! configured backend's namespace; backends enforce that on every call.

use std::fmt;

use crate::{Error, Result};

/// A parsed remote reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    scheme: String,
    namespace: String,
    key: String,
}

impl RemoteRef {
    /// Parse a `scheme://namespace/key...` string.
    ///
    /// # Errors
    ///
    /// Returns an error when the scheme separator or the namespace segment
    /// is missing.
    pub fn parse(raw: &str) -> Result<Self> {
        let (scheme, rest) = raw.split_once("://").ok_or_else(|| Error::InvalidRef {
            reference: raw.to_string(),
            message: "missing scheme separator".to_string(),
        })?;
        if scheme.is_empty() {
            return Err(Error::InvalidRef {
                reference: raw.to_string(),
                message: "empty scheme".to_string(),
            });
        }

        let (namespace, key) = match rest.split_once('/') {
            Some((ns, key)) => (ns, key.trim_start_matches('/')),
            None => (rest, ""),
        };
        if namespace.is_empty() {
            return Err(Error::InvalidRef {
                reference: raw.to_string(),
                message: "missing namespace segment".to_string(),
            });
        }

        Ok(Self {
            scheme: scheme.to_string(),
            namespace: namespace.to_string(),
            key: key.trim_end_matches('/').to_string(),
        })
    }

    /// Build a reference from parts, normalizing the key.
    pub fn new(scheme: &str, namespace: &str, key: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            namespace: namespace.trim_matches('/').to_string(),
            key: key.trim_matches('/').to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The object key (or prefix) under the namespace, no leading slash.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append a slash-separated relative segment to the key.
    pub fn join(&self, rel: &str) -> Self {
        let rel = rel.trim_matches('/');
        let key = if self.key.is_empty() {
            rel.to_string()
        } else if rel.is_empty() {
            self.key.clone()
        } else {
            format!("{}/{}", self.key, rel)
        };
        Self {
            scheme: self.scheme.clone(),
            namespace: self.namespace.clone(),
            key,
        }
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.namespace, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_namespace_and_key() {
        let r = RemoteRef::parse("oss://bucket/confsync/cfg/nvim").unwrap();
        assert_eq!(r.scheme(), "oss");
        assert_eq!(r.namespace(), "bucket");
        assert_eq!(r.key(), "confsync/cfg/nvim");
    }

    #[test]
    fn namespace_only_reference_has_empty_key() {
        let r = RemoteRef::parse("oss://bucket").unwrap();
        assert_eq!(r.key(), "");
    }

    #[test]
    fn missing_scheme_is_rejected() {
        assert!(RemoteRef::parse("bucket/key").is_err());
    }

    #[test]
    fn missing_namespace_is_rejected() {
        assert!(RemoteRef::parse("oss:///key").is_err());
    }

    #[test]
    fn join_extends_the_key() {
        let r = RemoteRef::parse("oss://bucket/base").unwrap();
        assert_eq!(r.join("a/b").to_string(), "oss://bucket/base/a/b");
    }
}
