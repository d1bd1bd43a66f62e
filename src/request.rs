//! Request builders.

use std::time::Duration;

use rasn_ldap::{ChangeOperation, ModifyRequestChanges};

use crate::{
    error::Error,
    filter::parse_filter,
    model::{Attribute, SearchRequestDerefAliases, SearchRequestScope},
};

/// A fully specified search request.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest(pub(crate) rasn_ldap::SearchRequest);

impl SearchRequest {
    /// Create a search request builder.
    pub fn builder() -> SearchRequestBuilder {
        SearchRequestBuilder::new()
    }

    /// A request for the root DSE object: empty base DN, base-object scope,
    /// presence filter on `objectClass`.
    pub fn root_dse() -> Self {
        SearchRequest(rasn_ldap::SearchRequest::new(
            "".into(),
            SearchRequestScope::BaseObject,
            SearchRequestDerefAliases::NeverDerefAliases,
            0,
            0,
            false,
            rasn_ldap::Filter::Present("objectClass".into()),
            Vec::new(),
        ))
    }
}

impl From<SearchRequest> for rasn_ldap::SearchRequest {
    fn from(req: SearchRequest) -> Self {
        req.0
    }
}

/// Builder for [`SearchRequest`].
///
/// The defaults are: empty base DN, base-object scope, never dereference
/// aliases, no size or time limit, full attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequestBuilder {
    base_dn: String,
    scope: SearchRequestScope,
    deref_aliases: SearchRequestDerefAliases,
    size_limit: u32,
    time_limit: Duration,
    types_only: bool,
    filter: String,
    attributes: Vec<String>,
}

impl Default for SearchRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchRequestBuilder {
    pub fn new() -> Self {
        Self {
            base_dn: Default::default(),
            scope: SearchRequestScope::BaseObject,
            deref_aliases: SearchRequestDerefAliases::NeverDerefAliases,
            size_limit: 0,
            time_limit: Duration::default(),
            types_only: false,
            filter: Default::default(),
            attributes: Vec::new(),
        }
    }

    /// Set the base DN.
    pub fn base_dn<S: AsRef<str>>(mut self, base_dn: S) -> Self {
        self.base_dn = base_dn.as_ref().to_owned();
        self
    }

    /// Set the search scope.
    pub fn scope(mut self, scope: SearchRequestScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the alias dereferencing policy.
    pub fn deref_aliases(mut self, deref_aliases: SearchRequestDerefAliases) -> Self {
        self.deref_aliases = deref_aliases;
        self
    }

    /// Set the server-side entry count limit. Zero means no limit.
    pub fn size_limit(mut self, size_limit: u32) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Set the server-side time limit for the operation.
    pub fn time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Request attribute names only, without values.
    pub fn types_only(mut self, types_only: bool) -> Self {
        self.types_only = types_only;
        self
    }

    /// Set the search filter, in RFC 4515 string representation.
    pub fn filter<S: AsRef<str>>(mut self, filter: S) -> Self {
        self.filter = filter.as_ref().to_owned();
        self
    }

    /// Add attributes to return.
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.attributes
            .extend(attributes.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Add a single attribute to return.
    pub fn attribute<S: AsRef<str>>(mut self, attribute: S) -> Self {
        self.attributes.push(attribute.as_ref().to_owned());
        self
    }

    /// Parse the filter and build the request.
    pub fn build(self) -> Result<SearchRequest, Error> {
        Ok(SearchRequest(rasn_ldap::SearchRequest::new(
            self.base_dn.into(),
            self.scope,
            self.deref_aliases,
            self.size_limit,
            self.time_limit.as_secs() as u32,
            self.types_only,
            parse_filter(&self.filter)?,
            self.attributes.into_iter().map(Into::into).collect(),
        )))
    }
}

/// A fully specified modify request.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifyRequest(pub(crate) rasn_ldap::ModifyRequest);

impl ModifyRequest {
    /// Create a modify request builder for the entry with the given DN.
    pub fn builder<S: AsRef<str>>(dn: S) -> ModifyRequestBuilder {
        ModifyRequestBuilder {
            dn: dn.as_ref().to_owned(),
            changes: Vec::new(),
        }
    }
}

impl From<ModifyRequest> for rasn_ldap::ModifyRequest {
    fn from(req: ModifyRequest) -> Self {
        req.0
    }
}

/// Builder for [`ModifyRequest`]. Changes are applied by the server in the
/// order they were added.
#[derive(Debug, Clone)]
pub struct ModifyRequestBuilder {
    dn: String,
    changes: Vec<ModifyRequestChanges>,
}

impl ModifyRequestBuilder {
    fn change(mut self, operation: ChangeOperation, attribute: Attribute) -> Self {
        self.changes.push(ModifyRequestChanges {
            operation,
            modification: attribute.into(),
        });
        self
    }

    /// Add the attribute values to the entry.
    pub fn add(self, attribute: Attribute) -> Self {
        self.change(ChangeOperation::Add, attribute)
    }

    /// Delete the attribute values, or the whole attribute if no values
    /// are given.
    pub fn delete(self, attribute: Attribute) -> Self {
        self.change(ChangeOperation::Delete, attribute)
    }

    /// Replace the attribute values with the given ones.
    pub fn replace(self, attribute: Attribute) -> Self {
        self.change(ChangeOperation::Replace, attribute)
    }

    /// Build the request.
    pub fn build(self) -> ModifyRequest {
        ModifyRequest(rasn_ldap::ModifyRequest {
            object: self.dn.into(),
            changes: self.changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_builder_defaults() {
        let req = SearchRequest::builder().filter("(cn=test)").build().unwrap();
        assert_eq!(req.0.scope, SearchRequestScope::BaseObject);
        assert_eq!(
            req.0.deref_aliases,
            SearchRequestDerefAliases::NeverDerefAliases
        );
        assert_eq!(req.0.size_limit, 0);
        assert_eq!(req.0.time_limit, 0);
        assert!(!req.0.types_only);
        assert!(req.0.attributes.is_empty());
    }

    #[test]
    fn root_dse_request() {
        let req = SearchRequest::root_dse();
        assert!(req.0.base_object.is_empty());
        assert_eq!(req.0.scope, SearchRequestScope::BaseObject);
        assert_eq!(
            req.0.filter,
            rasn_ldap::Filter::Present("objectClass".into())
        );
    }

    #[test]
    fn search_builder_rejects_malformed_filter() {
        assert!(SearchRequest::builder().filter("(cn=test").build().is_err());
    }

    #[test]
    fn modify_builder_keeps_change_order() {
        let req = ModifyRequest::builder("cn=test,dc=example,dc=com")
            .add(Attribute::new("mail", ["new@example.com"]))
            .delete(Attribute::new("mobile", Vec::<&str>::new()))
            .replace(Attribute::new("sn", ["Tester"]))
            .build();

        let ops: Vec<_> = req.0.changes.iter().map(|c| c.operation.clone()).collect();
        assert_eq!(
            ops,
            vec![
                ChangeOperation::Add,
                ChangeOperation::Delete,
                ChangeOperation::Replace
            ]
        );
    }
}
