//! Aliyun OSS storage backend
//!
//! Talks to the OSS REST API directly: header-signed requests (HMAC-SHA1),
//! virtual-hosted bucket URLs, and V2 object listing with continuation
//! tokens. Only the operations the sync protocol needs are implemented:
//! head/get/put/delete and prefix listing.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Method;
use reqwest::blocking::Client;
use serde::Deserialize;
use sha1::Sha1;
use walkdir::WalkDir;

use crate::backend::{StorageBackend, StoreConfig};
use crate::remote::RemoteRef;
use crate::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

const OCTET_STREAM: &str = "application/octet-stream";

pub struct OssBackend {
    bucket: String,
    access_key: String,
    secret_key: String,
    /// `scheme://bucket.host`, no trailing slash
    base_url: String,
    http: Client,
}

impl OssBackend {
    /// Validate the configuration and build a client.
    ///
    /// # Errors
    ///
    /// Returns an error when credentials, endpoint, or bucket are missing.
    pub fn new(config: StoreConfig) -> Result<Self> {
        if config.access_key.is_empty() || config.secret_key.is_empty() || config.endpoint.is_empty()
        {
            return Err(Error::Config {
                message: "OSS provider requires access_key, secret_key, and endpoint".to_string(),
            });
        }
        let bucket = config.bucket_name();
        if bucket.is_empty() {
            return Err(Error::Config {
                message: "OSS provider requires a bucket".to_string(),
            });
        }

        let endpoint = normalize_endpoint(&config.endpoint);
        let (scheme, host) = endpoint
            .split_once("://")
            .unwrap_or(("https", endpoint.as_str()));
        let base_url = format!("{scheme}://{bucket}.{host}");

        Ok(Self {
            bucket,
            access_key: config.access_key,
            secret_key: config.secret_key,
            base_url,
            http: Client::new(),
        })
    }

    fn check_ref(&self, reference: &RemoteRef) -> Result<()> {
        if reference.scheme() != "oss" {
            return Err(Error::SchemeMismatch {
                expected: "oss".to_string(),
                found: reference.scheme().to_string(),
            });
        }
        if reference.namespace() != self.bucket {
            return Err(Error::NamespaceMismatch {
                expected: self.bucket.clone(),
                found: reference.namespace().to_string(),
            });
        }
        if reference.key().is_empty() {
            return Err(Error::InvalidRef {
                reference: reference.to_string(),
                message: "object key is missing".to_string(),
            });
        }
        Ok(())
    }

    /// Build a request with Date and OSS Authorization headers.
    ///
    /// `signed_query` is the canonicalized sub-resource part (already
    /// sorted), `query` the full query string actually sent.
    fn request(
        &self,
        method: Method,
        key: &str,
        query: &str,
        signed_query: &str,
        content_type: &str,
    ) -> reqwest::blocking::RequestBuilder {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let resource = format!("/{}/{}{}", self.bucket, key, signed_query);
        let string_to_sign = format!("{}\n\n{}\n{}\n{}", method.as_str(), content_type, date, resource);
        let signature = self.sign(&string_to_sign);

        let url = if query.is_empty() {
            format!("{}/{}", self.base_url, key)
        } else {
            format!("{}/{}?{}", self.base_url, key, query)
        };

        let mut builder = self
            .http
            .request(method, url)
            .header("Date", date)
            .header("Authorization", format!("OSS {}:{}", self.access_key, signature));
        if !content_type.is_empty() {
            builder = builder.header("Content-Type", content_type);
        }
        builder
    }

    fn sign(&self, string_to_sign: &str) -> String {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(string_to_sign.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    fn object_exists(&self, key: &str) -> Result<bool> {
        let response = self
            .request(Method::HEAD, key, "", "", "")
            .send()
            .map_err(|e| Error::backend("head", key, e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status.as_u16() == 404 {
            Ok(false)
        } else {
            Err(Error::backend("head", key, format!("HTTP {status}")))
        }
    }

    fn get_object_to_file(&self, key: &str, dst: &Path) -> Result<()> {
        let mut response = self
            .request(Method::GET, key, "", "", "")
            .send()
            .map_err(|e| Error::backend("get", key, e.to_string()))?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(Error::NotFound {
                reference: format!("oss://{}/{}", self.bucket, key),
            });
        }
        if !status.is_success() {
            return Err(Error::backend("get", key, format!("HTTP {status}")));
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut file = fs::File::create(dst).map_err(|e| Error::io(dst, e))?;
        response
            .copy_to(&mut file)
            .map_err(|e| Error::backend("get", key, e.to_string()))?;
        Ok(())
    }

    fn put_object_from_file(&self, src: &Path, key: &str) -> Result<()> {
        let body = fs::read(src).map_err(|e| Error::io(src, e))?;
        let response = self
            .request(Method::PUT, key, "", "", OCTET_STREAM)
            .body(body)
            .send()
            .map_err(|e| Error::backend("put", key, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::backend("put", key, format!("HTTP {status}")));
        }
        Ok(())
    }

    fn delete_object(&self, key: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, key, "", "", "")
            .send()
            .map_err(|e| Error::backend("delete", key, e.to_string()))?;
        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            return Err(Error::backend("delete", key, format!("HTTP {status}")));
        }
        Ok(())
    }

    /// List all object keys under `prefix`, following continuation tokens.
    fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let (query, signed_query) = match &token {
                Some(t) => (
                    format!("list-type=2&prefix={prefix}&continuation-token={t}"),
                    format!("?continuation-token={t}&list-type=2"),
                ),
                None => (format!("list-type=2&prefix={prefix}"), "?list-type=2".to_string()),
            };
            let response = self
                .request(Method::GET, "", &query, &signed_query, "")
                .send()
                .map_err(|e| Error::backend("list", prefix, e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::backend("list", prefix, format!("HTTP {status}")));
            }
            let body = response
                .text()
                .map_err(|e| Error::backend("list", prefix, e.to_string()))?;
            let result: ListBucketResult = quick_xml::de::from_str(&body)
                .map_err(|e| Error::backend("list", prefix, e.to_string()))?;

            keys.extend(result.contents.into_iter().map(|c| c.key));
            match (result.is_truncated, result.next_continuation_token) {
                (true, Some(next)) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok(keys)
    }

    fn delete_prefix(&self, base: &str) -> Result<()> {
        for key in self.list_objects(base)? {
            // Only objects at or strictly under the base key.
            if key != base && !key.starts_with(&format!("{base}/")) {
                continue;
            }
            self.delete_object(&key)?;
        }
        Ok(())
    }
}

impl StorageBackend for OssBackend {
    fn pull(&self, src: &RemoteRef, dst: &Path) -> Result<()> {
        self.check_ref(src)?;
        let key = src.key();
        tracing::debug!(src = %src, dst = %dst.display(), "oss pull");

        if self.object_exists(key)? {
            return self.get_object_to_file(key, dst);
        }

        // Prefix download: replace the destination with the remote tree.
        let prefix = format!("{key}/");
        if dst.exists() {
            fs::remove_dir_all(dst).map_err(|e| Error::io(dst, e))?;
        }
        fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

        let keys = self.list_objects(&prefix)?;
        if keys.is_empty() {
            return Err(Error::NotFound {
                reference: src.to_string(),
            });
        }
        for object_key in keys {
            let rel = object_key
                .strip_prefix(&prefix)
                .unwrap_or(object_key.as_str());
            let mut local: PathBuf = dst.to_path_buf();
            for segment in rel.split('/') {
                local.push(segment);
            }
            self.get_object_to_file(&object_key, &local)?;
        }
        Ok(())
    }

    fn push(&self, src: &Path, dst: &RemoteRef) -> Result<()> {
        self.check_ref(dst)?;
        let key = dst.key();
        tracing::debug!(src = %src.display(), dst = %dst, "oss push");

        let metadata = fs::metadata(src).map_err(|e| Error::io(src, e))?;
        if !metadata.is_dir() {
            return self.put_object_from_file(src, key);
        }

        self.delete_prefix(key)?;
        for entry in WalkDir::new(src).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(src).to_path_buf();
                Error::backend("push", key, format!("walk failed at {}", path.display()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Walked paths are always under the walk root.
            let Ok(rel) = entry.path().strip_prefix(src) else {
                continue;
            };
            let object_key = format!("{key}/{}", conf_fs::path::to_slash(rel));
            self.put_object_from_file(entry.path(), &object_key)?;
        }
        Ok(())
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.contains("://") {
        return endpoint.to_string();
    }
    if endpoint.starts_with("oss-") {
        return format!("https://{endpoint}.aliyuncs.com");
    }
    format!("https://{endpoint}")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<ListedObject>,
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedObject {
    key: String,
}
