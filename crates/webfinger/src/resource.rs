//! WebFinger resource type.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// Path of the WebFinger endpoint on every host.
pub const WELL_KNOWN_PATH: &str = "/.well-known/webfinger";

/// A resource for which a WebFinger query can be issued.
///
/// A resource is an absolute URI. Email-like identifiers without a scheme
/// (`bob@example.com`) are treated as `acct:` URIs.
///
/// # Example
///
/// ```
/// use webfinger::Resource;
///
/// let resource = Resource::parse("bob@example.com").unwrap();
/// assert_eq!(resource.scheme(), "acct");
/// assert_eq!(resource.webfinger_host(), "example.com");
/// assert_eq!(resource.to_string(), "acct:bob@example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resource(Url);

/// Schemes with their own host derivation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scheme {
    Acct,
    Mailto,
    Other,
}

impl Scheme {
    fn of(url: &Url) -> Self {
        match url.scheme() {
            "acct" => Scheme::Acct,
            "mailto" => Scheme::Mailto,
            _ => Scheme::Other,
        }
    }
}

impl Resource {
    /// Parse a resource from a string.
    ///
    /// The input should be an absolute URI or an email-like identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::MalformedIdentifier`] when the input
    /// contains an invalid percent-escape, is not a valid URI, or has no
    /// scheme and no `@`.
    pub fn parse(raw: impl AsRef<str>) -> crate::Result<Self> {
        let raw = raw.as_ref();
        check_escapes(raw)?;

        match Url::parse(raw) {
            Ok(url) => Ok(Self(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if raw.split_once('@').is_none() {
                    return Err(malformed(raw, "must be absolute, or an email address"));
                }
                Self::parse(format!("acct:{}", raw))
            }
            Err(e) => Err(malformed(raw, &e.to_string())),
        }
    }

    /// Alias for [`Resource::parse`].
    pub fn new(raw: impl AsRef<str>) -> crate::Result<Self> {
        Self::parse(raw)
    }

    /// Returns the URI scheme, always lowercase and non-empty.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns the opaque part of URIs like `acct:bob@example.com`.
    ///
    /// Non-ASCII text is returned as written (`bob@bücher.example`), while
    /// escapes of ASCII characters such as `%40` are kept. Hierarchical URIs
    /// (`https://example.com/bob`) have no opaque part.
    pub fn opaque(&self) -> Option<Cow<'_, str>> {
        if self.0.cannot_be_a_base() {
            Some(decode_non_ascii(self.0.path()))
        } else {
            None
        }
    }

    /// Returns the canonical string form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host to send WebFinger queries for this resource to.
    ///
    /// An explicit host (and port) in the URI wins. Otherwise `acct:` and
    /// `mailto:` resources use everything after the first `@` of their opaque
    /// part. For any other resource the host is unknown and this is empty.
    pub fn webfinger_host(&self) -> String {
        if let Some(host) = self.0.host_str().filter(|h| !h.is_empty()) {
            return match self.0.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
        }

        match Scheme::of(&self.0) {
            Scheme::Acct | Scheme::Mailto => self
                .opaque()
                .and_then(|opaque| opaque.split_once('@').map(|(_, host)| host.to_string()))
                .unwrap_or_default(),
            Scheme::Other => String::new(),
        }
    }

    /// Returns the WebFinger query URL for this resource.
    ///
    /// Each entry of `rels` becomes a `rel` parameter, in order. Servers are
    /// free to ignore them.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::NoHost`] when no usable host can be
    /// derived from the resource.
    pub fn jrd_url(&self, rels: &[&str]) -> crate::Result<Url> {
        let host = self.webfinger_host();
        let no_host = || InvalidInputError::NoHost {
            resource: self.to_string(),
        };

        if host.is_empty() || host.contains(['@', '/', '?', '#', '\\']) {
            return Err(no_host().into());
        }

        let mut url =
            Url::parse(&format!("https://{}{}", host, WELL_KNOWN_PATH)).map_err(|_| no_host())?;

        {
            let mut query = url.query_pairs_mut();
            for rel in rels {
                query.append_pair("rel", rel);
            }
            query.append_pair("resource", self.as_str());
        }

        Ok(url)
    }
}

fn malformed(raw: &str, reason: &str) -> Error {
    InvalidInputError::MalformedIdentifier {
        value: raw.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Undo the escaping `url` applies to non-ASCII characters in opaque paths.
///
/// Only escapes of bytes >= 0x80 are decoded, so `%40` stays `%40` and the
/// first unescaped `@` still separates the local part from the domain.
fn decode_non_ascii(path: &str) -> Cow<'_, str> {
    let bytes = path.as_bytes();
    if !bytes.windows(2).any(|w| w[0] == b'%' && w[1] >= b'8' && w[1].is_ascii_hexdigit()) {
        return Cow::Borrowed(path);
    }

    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(byte) = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(|byte| *byte >= 0x80)
        {
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    match String::from_utf8(decoded) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Borrowed(path),
    }
}

/// Every `%` must start a two-digit hex escape.
fn check_escapes(raw: &str) -> crate::Result<()> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(malformed(raw, "invalid escape sequence"));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Resource::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for Resource {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
