//! Scope descriptors, relating scope names to the user claims they release.
use std::collections::HashMap;

use async_trait::async_trait;

use super::PrimitiveError;

/// Description of one scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeDescriptor {
    /// The scope-token.
    pub name: String,

    /// User claims released into the id token when the scope is granted.
    pub claims: Vec<String>,

    /// If this is one of the OpenID Connect standard scopes.
    pub is_openid_scope: bool,

    /// If the scope may be shown to resource owners on consent pages.
    pub is_exposed: bool,
}

/// Lookup of scope descriptors.
#[async_trait]
pub trait ScopeRepository: Send + Sync {
    /// The descriptors of all known scopes among `names`. Unknown names are skipped.
    async fn search_by_names(&self, names: &[&str]) -> Result<Vec<ScopeDescriptor>, PrimitiveError>;
}

/// A fixed set of scopes.
#[derive(Default)]
pub struct ScopeCatalog {
    scopes: HashMap<String, ScopeDescriptor>,
}

impl ScopeDescriptor {
    /// An exposed, non-standard scope releasing the given claims.
    pub fn new<I, S>(name: &str, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeDescriptor {
            name: name.to_string(),
            claims: claims.into_iter().map(Into::into).collect(),
            is_openid_scope: false,
            is_exposed: true,
        }
    }

    fn standard(name: &str, claims: &[&str]) -> Self {
        ScopeDescriptor {
            is_openid_scope: true,
            ..ScopeDescriptor::new(name, claims.iter().copied())
        }
    }
}

impl ScopeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        ScopeCatalog::default()
    }

    /// The standard scopes of OpenID Connect Core, section 5.4.
    pub fn openid() -> Self {
        let mut catalog = ScopeCatalog::new();
        catalog.register(ScopeDescriptor::standard("openid", &["sub"]));
        catalog.register(ScopeDescriptor::standard(
            "profile",
            &[
                "name",
                "family_name",
                "given_name",
                "middle_name",
                "nickname",
                "preferred_username",
                "profile",
                "picture",
                "website",
                "gender",
                "birthdate",
                "zoneinfo",
                "locale",
                "updated_at",
            ],
        ));
        catalog.register(ScopeDescriptor::standard("email", &["email", "email_verified"]));
        catalog.register(ScopeDescriptor::standard("address", &["address"]));
        catalog.register(ScopeDescriptor::standard("phone", &["phone_number", "phone_number_verified"]));
        catalog
    }

    /// Add or replace a scope.
    pub fn register(&mut self, scope: ScopeDescriptor) {
        self.scopes.insert(scope.name.clone(), scope);
    }
}

#[async_trait]
impl ScopeRepository for ScopeCatalog {
    async fn search_by_names(&self, names: &[&str]) -> Result<Vec<ScopeDescriptor>, PrimitiveError> {
        Ok(names
            .iter()
            .filter_map(|name| self.scopes.get(*name))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_scopes() {
        let mut catalog = ScopeCatalog::openid();
        catalog.register(ScopeDescriptor::new("api", Vec::<String>::new()));

        let found = smol::block_on(catalog.search_by_names(&["email", "unknown", "api"])).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].claims, vec!["email", "email_verified"]);
        assert!(found[0].is_openid_scope);
        assert!(!found[1].is_openid_scope);
    }
}
