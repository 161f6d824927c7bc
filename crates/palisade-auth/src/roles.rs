//! Role catalog helpers.
//!
//! The catalog is read-only injected data: the surrounding service
//! layer uses it to compute scopes before calling the orchestrator.
//! The name-to-definition mapping is explicit and validated at load
//! time — there is no dynamic flag lookup.

use std::collections::{BTreeSet, HashMap};

use palisade_core::error::{CoreError, CoreResult};
use palisade_core::models::role::RoleDefinition;

/// Built-in role set used when the embedding service supplies none.
pub fn default_roles() -> Vec<RoleDefinition> {
    vec![
        RoleDefinition {
            slug: "system_admin".into(),
            name: "System Administrator".into(),
            description: "Full administrative access, including role and security policy management.".into(),
            permissions: vec![
                "auth:users:read".into(),
                "auth:users:write".into(),
                "auth:roles:read".into(),
                "auth:roles:write".into(),
                "auth:mfa:reset".into(),
                "audit:events:export".into(),
            ],
            mfa_required: true,
            is_default: false,
        },
        RoleDefinition {
            slug: "project_manager".into(),
            name: "Project Manager".into(),
            description: "Elevated read/write permissions with limited security scope.".into(),
            permissions: vec![
                "projects:read".into(),
                "projects:write".into(),
                "crew:assign".into(),
                "assets:reserve".into(),
                "auth:users:read".into(),
            ],
            mfa_required: true,
            is_default: true,
        },
        RoleDefinition {
            slug: "auditor".into(),
            name: "Security Auditor".into(),
            description: "Read-only visibility into audit and security events.".into(),
            permissions: vec![
                "audit:events:read".into(),
                "auth:roles:read".into(),
                "auth:users:read".into(),
            ],
            mfa_required: false,
            is_default: false,
        },
        RoleDefinition {
            slug: "viewer".into(),
            name: "Operations Viewer".into(),
            description: "Baseline read-only access to operational data.".into(),
            permissions: vec![
                "projects:read".into(),
                "assets:read".into(),
                "inventory:read".into(),
            ],
            mfa_required: false,
            is_default: true,
        },
    ]
}

/// Slug-indexed role catalog.
pub struct RoleCatalog {
    roles: HashMap<String, RoleDefinition>,
}

impl RoleCatalog {
    /// Build a catalog, rejecting duplicate slugs up front instead of
    /// letting them surface as ambiguous runtime lookups.
    pub fn new(definitions: Vec<RoleDefinition>) -> CoreResult<Self> {
        let mut roles = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let slug = definition.slug.clone();
            if roles.insert(slug.clone(), definition).is_some() {
                return Err(CoreError::Validation {
                    message: format!("duplicate role slug: {slug}"),
                });
            }
        }
        Ok(Self { roles })
    }

    pub fn builtin() -> Self {
        // default_roles() has no duplicates.
        Self::new(default_roles()).unwrap_or(Self {
            roles: HashMap::new(),
        })
    }

    pub fn get(&self, slug: &str) -> Option<&RoleDefinition> {
        self.roles.get(slug)
    }

    /// Permissions for a role; empty for unknown slugs.
    pub fn permissions_for(&self, slug: &str) -> &[String] {
        self.roles
            .get(slug)
            .map(|role| role.permissions.as_slice())
            .unwrap_or(&[])
    }

    /// The full permission set across all roles, sorted.
    pub fn all_permissions(&self) -> BTreeSet<String> {
        self.roles
            .values()
            .flat_map(|role| role.permissions.iter().cloned())
            .collect()
    }

    /// Whether any of `slugs` names a role that mandates MFA.
    pub fn mfa_required(&self, slugs: &[String]) -> bool {
        slugs
            .iter()
            .any(|slug| self.get(slug).is_some_and(|role| role.mfa_required))
    }

    /// Roles marked as defaults for new users.
    pub fn defaults(&self) -> Vec<&RoleDefinition> {
        self.roles.values().filter(|role| role.is_default).collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves_roles() {
        let catalog = RoleCatalog::builtin();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get("system_admin").unwrap().mfa_required);
        assert!(catalog
            .permissions_for("auditor")
            .contains(&"audit:events:read".to_string()));
        assert!(catalog.permissions_for("no-such-role").is_empty());
    }

    #[test]
    fn duplicate_slugs_rejected_at_load() {
        let mut definitions = default_roles();
        definitions.push(definitions[0].clone());
        assert!(RoleCatalog::new(definitions).is_err());
    }

    #[test]
    fn mfa_required_checks_any_role() {
        let catalog = RoleCatalog::builtin();
        assert!(catalog.mfa_required(&["viewer".into(), "system_admin".into()]));
        assert!(!catalog.mfa_required(&["viewer".into(), "auditor".into()]));
    }

    #[test]
    fn all_permissions_union() {
        let catalog = RoleCatalog::builtin();
        let all = catalog.all_permissions();
        assert!(all.contains("auth:mfa:reset"));
        assert!(all.contains("inventory:read"));
    }

    #[test]
    fn defaults_marked() {
        let catalog = RoleCatalog::builtin();
        let defaults: Vec<&str> = catalog
            .defaults()
            .iter()
            .map(|role| role.slug.as_str())
            .collect();
        assert_eq!(defaults.len(), 2);
        assert!(defaults.contains(&"viewer"));
        assert!(defaults.contains(&"project_manager"));
    }
}
