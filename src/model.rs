//! Directory data structures.

use bytes::Bytes;
use rasn::types::SetOf;
pub use rasn_ldap::{ChangeOperation, ResultCode, SearchRequestDerefAliases, SearchRequestScope};

/// A single attribute of a directory entry: a name and a set of values.
///
/// LDAP attribute values are octet strings; whether they hold readable text
/// depends on the attribute syntax, so values are exposed as [`Bytes`].
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute values
    pub values: Vec<Bytes>,
}

/// Attribute list of an entry.
pub type Attributes = Vec<Attribute>;

impl Attribute {
    /// Create an attribute from a name and any iterator of values.
    pub fn new<N, I, V>(name: N, values: I) -> Self
    where
        N: AsRef<str>,
        I: IntoIterator<Item = V>,
        V: Into<Bytes>,
    {
        Attribute {
            name: name.as_ref().to_owned(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<rasn_ldap::PartialAttribute> for Attribute {
    fn from(raw: rasn_ldap::PartialAttribute) -> Self {
        Attribute {
            name: raw.r#type.0,
            values: raw.vals.to_vec().into_iter().cloned().collect(),
        }
    }
}

impl From<Attribute> for rasn_ldap::PartialAttribute {
    fn from(attr: Attribute) -> Self {
        rasn_ldap::PartialAttribute::new(attr.name.into(), SetOf::from_vec(attr.values))
    }
}

impl From<Attribute> for rasn_ldap::Attribute {
    fn from(attr: Attribute) -> Self {
        rasn_ldap::Attribute::new(attr.name.into(), SetOf::from_vec(attr.values))
    }
}

/// A directory entry returned by a search: its DN plus attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchEntry {
    /// Distinguished name of the entry
    pub dn: String,
    /// Entry attributes
    pub attributes: Attributes,
}

impl SearchEntry {
    /// Return all values of the named attribute, if present.
    ///
    /// The name comparison is case-insensitive, as attribute descriptions
    /// are in the protocol.
    pub fn attribute<S: AsRef<str>>(&self, name: S) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name.as_ref()))
    }
}

impl From<rasn_ldap::SearchResultEntry> for SearchEntry {
    fn from(raw: rasn_ldap::SearchResultEntry) -> Self {
        SearchEntry {
            dn: raw.object_name.0,
            attributes: raw.attributes.into_iter().map(Into::into).collect(),
        }
    }
}
