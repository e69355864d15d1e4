use serde::Serialize;

use super::token_introspection::{Claims, Roles};
use crate::constants::{ROLE_ADMIN, ROLE_CREATOR, ROLE_PREFIX, ROLE_USER};

/// What the signed-in user may do, for UI gating only. The server re-checks
/// every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    pub is_admin: bool,
    pub is_creator: bool,
    pub is_authenticated_user: bool,
}

impl CapabilitySet {
    pub const fn none() -> Self {
        Self {
            is_admin: false,
            is_creator: false,
            is_authenticated_user: false,
        }
    }

    pub const fn is_empty(&self) -> bool {
        !self.is_admin && !self.is_creator && !self.is_authenticated_user
    }

    /// Offer "become creator" to signed-in users who are not creators yet.
    pub const fn can_become_creator(&self) -> bool {
        self.is_authenticated_user && !self.is_creator
    }
}

/// Capabilities carried by decoded claims; `None` yields no capabilities.
pub fn derive(claims: Option<&Claims>) -> CapabilitySet {
    derive_roles(claims.and_then(|c| c.roles.as_ref()))
}

/// Capabilities for a roles value from a token or a "who am I" response.
pub fn derive_roles(roles: Option<&Roles>) -> CapabilitySet {
    roles.map_or_else(CapabilitySet::none, |roles| {
        roles
            .tags()
            .into_iter()
            .fold(CapabilitySet::none(), |mut caps, tag| {
                match canonical_tag(tag).as_str() {
                    ROLE_ADMIN => caps.is_admin = true,
                    ROLE_CREATOR => caps.is_creator = true,
                    ROLE_USER => caps.is_authenticated_user = true,
                    _ => {}
                }
                caps
            })
    })
}

/// Human readable roles, e.g. `USER, CREATOR`.
pub fn display_roles(roles: Option<&Roles>) -> String {
    roles
        .map(|roles| {
            roles
                .tags()
                .into_iter()
                .map(|tag| tag.strip_prefix(ROLE_PREFIX).unwrap_or(tag))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

// The server prefixes bare tags with ROLE_ when it issues tokens; match that here
fn canonical_tag(tag: &str) -> String {
    if tag.starts_with(ROLE_PREFIX) {
        tag.to_string()
    } else {
        format!("{ROLE_PREFIX}{tag}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn caps(roles: &str) -> CapabilitySet {
        derive_roles(Some(&Roles::from(roles)))
    }

    #[test]
    fn test_user_and_admin() {
        assert_eq!(
            caps("ROLE_USER,ROLE_ADMIN"),
            CapabilitySet {
                is_admin: true,
                is_creator: false,
                is_authenticated_user: true,
            }
        );
    }

    #[test]
    fn test_admin_and_creator_are_independent() {
        let both = caps("ROLE_USER, ROLE_CREATOR ,ROLE_ADMIN");
        assert!(both.is_admin && both.is_creator);

        let creator = caps("ROLE_USER,ROLE_CREATOR");
        assert!(creator.is_creator && !creator.is_admin);

        let admin = caps("ROLE_ADMIN");
        assert!(admin.is_admin && !admin.is_creator && !admin.is_authenticated_user);
    }

    #[test]
    fn test_absent_or_empty_roles_grant_nothing() {
        assert!(derive(None).is_empty());
        assert!(derive_roles(None).is_empty());
        assert!(caps("").is_empty());
        assert!(caps(" , ,").is_empty());
        assert!(derive_roles(Some(&Roles::List(vec![]))).is_empty());

        let claims = Claims {
            sub: Some("ana".into()),
            exp: 1,
            roles: None,
            iat: None,
        };
        assert!(derive(Some(&claims)).is_empty());
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!(caps("role_admin,Role_Creator").is_empty());
    }

    #[test]
    fn test_bare_tags_are_prefixed() {
        let c = caps("USER,ADMIN");
        assert!(c.is_admin && c.is_authenticated_user);
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        assert_eq!(caps("ROLE_SUPERADMIN,ROLE_ADMINISTRATOR"), CapabilitySet::none());
    }

    #[test]
    fn test_list_form_matches_joined_form() {
        let list = Roles::List(vec!["ROLE_USER".into(), "ROLE_CREATOR".into()]);
        assert_eq!(derive_roles(Some(&list)), caps("ROLE_USER,ROLE_CREATOR"));
    }

    #[test]
    fn test_become_creator_offer() {
        assert!(caps("ROLE_USER").can_become_creator());
        assert!(!caps("ROLE_USER,ROLE_CREATOR").can_become_creator());
        assert!(!CapabilitySet::none().can_become_creator());
    }

    #[test]
    fn test_display_roles() {
        assert_eq!(
            display_roles(Some(&Roles::from("ROLE_USER,ROLE_CREATOR"))),
            "USER, CREATOR"
        );
        assert_eq!(display_roles(None), "");
    }

    proptest! {
        #[test]
        fn derive_is_pure(roles in ".{0,64}") {
            let parsed = Roles::from(roles.as_str());
            prop_assert_eq!(derive_roles(Some(&parsed)), derive_roles(Some(&parsed)));
        }

        #[test]
        fn derive_is_order_insensitive(mut tags in proptest::collection::vec(
            prop_oneof![
                Just("ROLE_USER".to_string()),
                Just("ROLE_ADMIN".to_string()),
                Just("ROLE_CREATOR".to_string()),
                "[A-Z_]{0,12}",
            ],
            0..6,
        )) {
            let forward = caps(&tags.join(","));
            tags.reverse();
            prop_assert_eq!(forward, caps(&tags.join(",")));
        }
    }
}
