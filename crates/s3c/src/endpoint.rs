//! Endpoint parsing and addressing style.
//!
//! Amazon endpoints use virtual-host-style addressing (the bucket becomes a
//! subdomain of `s3.amazonaws.com`); every other endpoint is treated as a
//! self-hosted service and addressed path-style.

use crate::error::{Error, S3Result};

use url::Url;

/// URL scheme recognized by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// A parsed S3 endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
    virtual_style: bool,
}

impl Endpoint {
    /// Parses an endpoint URL such as `https://s3.amazonaws.com` or
    /// `http://play.example.com:9000`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidProtocol`] for schemes other than `http` and
    /// `https`, and [`Error::InvalidEndpoint`] for URLs that are not a bare
    /// host, or for `amazonaws.com` hosts other than `s3.amazonaws.com`.
    pub fn parse(endpoint: &str) -> S3Result<Self> {
        let url = Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(Error::InvalidProtocol(other.to_owned())),
        };

        let Some(host) = url.host_str() else {
            return Err(Error::InvalidEndpoint(format!("{endpoint}: missing host")));
        };
        let host = host.to_owned();

        if !matches!(url.path(), "" | "/") {
            return Err(Error::InvalidEndpoint(format!("{endpoint}: unexpected path")));
        }

        let port = url.port().unwrap_or_else(|| scheme.default_port());

        let virtual_style = if host == "amazonaws.com" || host.ends_with(".amazonaws.com") {
            if host != "s3.amazonaws.com" {
                return Err(Error::InvalidEndpoint(format!(
                    "{endpoint}: Amazon endpoints must use s3.amazonaws.com"
                )));
            }
            true
        } else {
            false
        };

        Ok(Self {
            scheme,
            host,
            port,
            virtual_style,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether buckets are addressed as subdomains.
    #[must_use]
    pub fn is_virtual_style(&self) -> bool {
        self.virtual_style
    }

    /// Host part for a request, with the bucket as a subdomain in
    /// virtual-host-style mode.
    pub(crate) fn host_for(&self, bucket: Option<&str>) -> String {
        match bucket {
            Some(bucket) if self.virtual_style => format!("{bucket}.{}", self.host),
            _ => self.host.clone(),
        }
    }

    /// `Host` header value: the host plus the port when it is not the
    /// scheme's default.
    pub(crate) fn authority_for(&self, bucket: Option<&str>) -> String {
        let host = self.host_for(bucket);
        if self.port == self.scheme.default_port() {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }

    /// URI path for a request. The bucket lives in the path in path-style
    /// mode; the object key must already be resource-escaped.
    pub(crate) fn uri_path_for(&self, bucket: Option<&str>, escaped_object: Option<&str>) -> String {
        let mut path = String::from("/");
        if !self.virtual_style {
            if let Some(bucket) = bucket {
                path.push_str(bucket);
            }
        }
        if let Some(key) = escaped_object {
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str(key);
        }
        path
    }
}
