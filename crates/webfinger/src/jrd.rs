//! JSON Resource Descriptor (JRD) documents.
//!
//! A JRD is what a WebFinger endpoint returns: a subject, its aliases,
//! properties and an ordered list of typed links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::Error;

/// Properties keyed by URI.
///
/// A key mapped to `None` was sent as an explicit `null`, which is distinct
/// from the key being absent.
pub type Properties = BTreeMap<String, Option<String>>;

/// A JSON Resource Descriptor.
///
/// # Example
///
/// ```
/// use webfinger::Jrd;
///
/// let jrd = Jrd::from_slice(br#"{
///     "subject": "acct:bob@example.com",
///     "links": [{"rel": "self", "href": "https://example.com/bob"}]
/// }"#).unwrap();
///
/// assert_eq!(jrd.subject.as_deref(), Some("acct:bob@example.com"));
/// assert_eq!(jrd.link_by_rel("self").unwrap().href.as_deref(), Some("https://example.com/bob"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jrd {
    /// URI of the entity the document describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// When the document stops being valid, if the server says so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// Other URIs that identify the same entity, in server order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Properties of the subject.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,

    /// Links in server order; the first match for a relation wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// A link within a JRD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation type, a URI or a registered keyword.
    pub rel: String,

    /// Media type of the link target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Target URI of the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// URI template, used instead of `href` by some relations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Human-readable titles keyed by language tag (or `default`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub titles: BTreeMap<String, String>,

    /// Properties of the link itself.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl Jrd {
    /// Decode a JRD from raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the input is not JSON or does not have
    /// the shape of a JRD.
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Returns the value of a property, or `""` if it is absent or null.
    pub fn property(&self, key: &str) -> &str {
        property(&self.properties, key)
    }

    /// Returns the first link with the given relation type.
    pub fn link_by_rel(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }

    /// Returns all links with the given relation type, in document order.
    pub fn links_by_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.rel == rel)
    }

    /// Whether the document has expired at the given instant.
    ///
    /// Documents without an `expires` member never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

impl Link {
    /// Returns the value of a property, or `""` if it is absent or null.
    pub fn property(&self, key: &str) -> &str {
        property(&self.properties, key)
    }

    /// Returns the title for a language tag, falling back to `default`.
    pub fn title(&self, lang: &str) -> Option<&str> {
        self.titles
            .get(lang)
            .or_else(|| self.titles.get("default"))
            .map(String::as_str)
    }
}

fn property<'a>(properties: &'a Properties, key: &str) -> &'a str {
    properties
        .get(key)
        .and_then(Option::as_deref)
        .unwrap_or_default()
}

impl FromStr for Jrd {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}
