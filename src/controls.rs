//! LDAP controls.

use rasn::{ber, types::Integer, types::OctetString, AsnType, Decode, Decoder, Encode};
use rasn_ldap::Control;

use crate::error::Error;

/// Simple paged results control (RFC 2696), OID 1.2.840.113556.1.4.319.
///
/// In a request, `size` is the desired page size. In a response, the cookie
/// is the continuation marker for the next page; an empty cookie means the
/// result set is exhausted.
#[derive(Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct SimplePagedResultsControl {
    size: Integer,
    cookie: OctetString,
    has_entries: bool,
}

// the control value is itself a BER-encoded sequence
#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
struct PagedResultsValue {
    size: Integer,
    cookie: OctetString,
}

impl SimplePagedResultsControl {
    /// Control OID.
    pub const OID: &'static [u8] = crate::oid::SIMPLE_PAGED_RESULTS_CONTROL_OID;

    /// Create a request control with the given page size.
    pub fn new(size: u32) -> Self {
        Self {
            size: size.into(),
            cookie: OctetString::default(),
            has_entries: true,
        }
    }

    /// Return the control with its page size replaced.
    pub fn with_size(self, size: u32) -> Self {
        Self {
            size: size.into(),
            ..self
        }
    }

    /// The continuation cookie.
    pub fn cookie(&self) -> &OctetString {
        &self.cookie
    }

    /// The page size (request) or the server's result-set size estimate
    /// (response).
    pub fn size(&self) -> &Integer {
        &self.size
    }

    /// True while the server indicates more entries are available.
    pub fn has_entries(&self) -> bool {
        self.has_entries
    }

    #[cfg(test)]
    pub(crate) fn from_parts(size: u32, cookie: &'static [u8]) -> Self {
        Self {
            size: size.into(),
            cookie: OctetString::from_static(cookie),
            has_entries: !cookie.is_empty(),
        }
    }
}

impl TryFrom<SimplePagedResultsControl> for Control {
    type Error = Error;

    fn try_from(control: SimplePagedResultsControl) -> Result<Self, Self::Error> {
        let value = PagedResultsValue {
            size: control.size,
            cookie: control.cookie,
        };
        Ok(Control::new(
            SimplePagedResultsControl::OID.into(),
            false,
            Some(ber::encode(&value)?.into()),
        ))
    }
}

impl TryFrom<Control> for SimplePagedResultsControl {
    type Error = Error;

    fn try_from(control: Control) -> Result<Self, Self::Error> {
        let value =
            ber::decode::<PagedResultsValue>(control.control_value.as_deref().unwrap_or(b""))?;
        let has_entries = !value.cookie.is_empty();

        Ok(SimplePagedResultsControl {
            size: value.size,
            cookie: value.cookie,
            has_entries,
        })
    }
}
