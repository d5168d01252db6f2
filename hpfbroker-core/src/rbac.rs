//! Role-based access control
//!
//! Roles hold permissions directly and inherit every permission of their
//! parent roles. The graph is built once at start-up and is read-only after
//! that, so it can be shared freely between request handlers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Atomic capabilities checked by the API
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read hpfeeds identities
    HpfRead,
    /// Create, update and delete hpfeeds identities
    HpfWrite,
    /// Read administrative users
    UserRead,
    /// Create, update and delete administrative users
    UserWrite,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::HpfRead,
        Permission::HpfWrite,
        Permission::UserRead,
        Permission::UserWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::HpfRead => "hpf_read",
            Permission::HpfWrite => "hpf_write",
            Permission::UserRead => "user_read",
            Permission::UserWrite => "user_write",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hpf_read" => Ok(Permission::HpfRead),
            "hpf_write" => Ok(Permission::HpfWrite),
            "user_read" => Ok(Permission::UserRead),
            "user_write" => Ok(Permission::UserWrite),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

/// Role labels of the standard graph
pub mod roles {
    /// Read access to hpfeeds identities
    pub const HPF_READER: &str = "hpf_reader";
    /// Full control of hpfeeds identities
    pub const HPF_ADMIN: &str = "hpf_admin";
    /// Read access to users
    pub const USER_READER: &str = "user_reader";
    /// Full control of users
    pub const USER_ADMIN: &str = "user_admin";
    /// Inherits both admin roles
    pub const SUPER_ADMIN: &str = "super_admin";

    pub const ALL: [&str; 5] = [HPF_READER, HPF_ADMIN, USER_READER, USER_ADMIN, SUPER_ADMIN];
}

#[derive(Debug, Clone, Default)]
struct RoleNode {
    permissions: HashSet<Permission>,
    parents: Vec<String>,
}

/// Immutable role graph answering grant queries
#[derive(Debug, Clone)]
pub struct Rbac {
    roles: BTreeMap<String, RoleNode>,
}

impl Rbac {
    /// Start building a custom graph
    pub fn builder() -> RbacBuilder {
        RbacBuilder::default()
    }

    /// The fixed role set used by the management API
    pub fn standard() -> Self {
        use Permission::*;

        Self::builder()
            .role(roles::HPF_READER, [HpfRead])
            .role(roles::HPF_ADMIN, [HpfRead, HpfWrite])
            .role(roles::USER_READER, [UserRead])
            .role(roles::USER_ADMIN, [UserRead, UserWrite])
            .parents(roles::SUPER_ADMIN, [roles::HPF_ADMIN, roles::USER_ADMIN])
            .build()
    }

    /// Whether `role`, or any role it inherits from, holds `permission`.
    /// Unknown roles are granted nothing.
    pub fn is_granted(&self, role: &str, permission: Permission) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![role];

        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            let Some(node) = self.roles.get(name) else {
                continue;
            };
            if node.permissions.contains(&permission) {
                return true;
            }
            pending.extend(node.parents.iter().map(String::as_str));
        }

        false
    }

    /// Same as [`Rbac::is_granted`] for a permission given by name; unknown
    /// permission names are never granted.
    pub fn is_granted_by_name(&self, role: &str, permission: &str) -> bool {
        permission
            .parse::<Permission>()
            .map(|p| self.is_granted(role, p))
            .unwrap_or(false)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Role names in lexicographic order
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Every permission the role resolves to, inherited ones included
    pub fn permissions_of(&self, role: &str) -> HashSet<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.is_granted(role, *p))
            .collect()
    }
}

impl Default for Rbac {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder used to seed an [`Rbac`] graph before it is frozen
#[derive(Debug, Default)]
pub struct RbacBuilder {
    roles: BTreeMap<String, RoleNode>,
}

impl RbacBuilder {
    /// Add a role (or extend an existing one) with direct permissions
    pub fn role<I>(mut self, name: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.roles
            .entry(name.to_string())
            .or_default()
            .permissions
            .extend(permissions);
        self
    }

    /// Declare the parents of a role; missing roles are created empty
    pub fn parents<'a, I>(mut self, name: &str, parents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let parents: Vec<String> = parents.into_iter().map(str::to_string).collect();
        for parent in &parents {
            self.roles.entry(parent.clone()).or_default();
        }
        self.roles.entry(name.to_string()).or_default().parents = parents;
        self
    }

    pub fn build(self) -> Rbac {
        Rbac { roles: self.roles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Permission::*;

    #[test]
    fn test_standard_grant_matrix() {
        let rbac = Rbac::standard();

        let expected: [(&str, [bool; 4]); 5] = [
            (roles::HPF_READER, [true, false, false, false]),
            (roles::HPF_ADMIN, [true, true, false, false]),
            (roles::USER_READER, [false, false, true, false]),
            (roles::USER_ADMIN, [false, false, true, true]),
            (roles::SUPER_ADMIN, [true, true, true, true]),
        ];

        for (role, grants) in expected {
            for (permission, granted) in Permission::ALL.into_iter().zip(grants) {
                assert_eq!(
                    rbac.is_granted(role, permission),
                    granted,
                    "{} / {}",
                    role,
                    permission
                );
            }
        }
    }

    #[test]
    fn test_super_admin_inherits_everything() {
        let rbac = Rbac::standard();
        assert_eq!(rbac.permissions_of(roles::SUPER_ADMIN).len(), 4);
        assert!(rbac.roles[roles::SUPER_ADMIN].permissions.is_empty());
    }

    #[test]
    fn test_unknown_role_or_permission_is_denied() {
        let rbac = Rbac::standard();
        assert!(!rbac.is_granted("nobody", HpfRead));
        assert!(!rbac.is_granted("", UserWrite));
        assert!(!rbac.is_granted_by_name(roles::SUPER_ADMIN, "launch_missiles"));
        assert!(rbac.is_granted_by_name(roles::HPF_READER, "hpf_read"));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let rbac = Rbac::builder()
            .role("a", [HpfRead])
            .parents("a", ["b"])
            .parents("b", ["a"])
            .build();

        assert!(rbac.is_granted("b", HpfRead));
        assert!(!rbac.is_granted("b", HpfWrite));
    }

    #[test]
    fn test_role_listing() {
        let rbac = Rbac::standard();
        let names: Vec<&str> = rbac.roles().collect();
        assert_eq!(names.len(), roles::ALL.len());
        for role in roles::ALL {
            assert!(rbac.has_role(role));
        }
        assert!(!rbac.has_role("doesnt_exist"));
    }

    #[test]
    fn test_permission_parsing() {
        for permission in Permission::ALL {
            assert_eq!(permission.to_string().parse::<Permission>(), Ok(permission));
        }
        assert!("HPF_READ".parse::<Permission>().is_err());
    }
}
