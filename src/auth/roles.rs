use std::collections::{BTreeSet, HashMap};

use super::AuthError;

/// Prefix that marks a role as an authority.
pub const ROLE_PREFIX: &str = "ROLE_";

/// ✅ **Authorities granted to a caller** (`ROLE_ADMIN`, `ROLE_USER`, ...)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role, prefixing it with `ROLE_` unless it already carries the prefix.
    pub fn insert(&mut self, role: impl AsRef<str>) {
        self.0.insert(authority(role.as_ref()));
    }

    /// ✅ **Check for a role**, with or without the `ROLE_` prefix (`has_role("ADMIN")`)
    pub fn has_role(&self, role: &str) -> bool {
        self.0.contains(&authority(role))
    }

    /// Exact authority lookup.
    pub fn contains(&self, authority: &str) -> bool {
        self.0.contains(authority)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut roles = RoleSet::new();
        for role in iter {
            roles.insert(role);
        }
        roles
    }
}

fn authority(role: &str) -> String {
    if role.starts_with(ROLE_PREFIX) {
        role.to_string()
    } else {
        format!("{ROLE_PREFIX}{role}")
    }
}

/// ✅ **Query-level access rules**: query name → role required to run it.
/// Queries without a rule are open to everyone, including anonymous callers.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessPolicy {
    rules: HashMap<String, String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(HashMap::from([("persons".to_string(), "ADMIN".to_string())]))
    }
}

impl AccessPolicy {
    pub fn new(rules: HashMap<String, String>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &HashMap<String, String> {
        &self.rules
    }

    pub fn required_role(&self, operation: &str) -> Option<&str> {
        self.rules.get(operation).map(String::as_str)
    }

    /// Allows `operation` when it has no rule, or when `roles` holds the required role.
    /// Anonymous callers (`None`) only pass open operations.
    pub fn authorize(&self, operation: &str, roles: Option<&RoleSet>) -> Result<(), AuthError> {
        match self.required_role(operation) {
            None => Ok(()),
            Some(required) if roles.is_some_and(|r| r.has_role(required)) => Ok(()),
            Some(required) => {
                tracing::warn!(operation, required_role = required, "Access denied");
                Err(AuthError::Unauthorized)
            }
        }
    }
}
