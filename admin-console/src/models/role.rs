//! Role hierarchy - a closed, totally ordered set of privilege tiers.
//!
//! Every privilege check reduces to "does the held tier rank at or above
//! the required tier". Labels that are not in the set do not rank at all:
//! parsing them is an explicit error, and privilege checks treat them as
//! unprivileged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Privilege tiers, declared lowest to highest. The derived `Ord` is the
/// hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Premium,
    Support,
    #[serde(rename = "Senior Support")]
    SeniorSupport,
    Moderator,
    Admin,
    Owner,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("unknown role label: {0}")]
    Unknown(String),
}

impl Role {
    /// All tiers, lowest to highest privilege.
    pub const ALL: [Role; 7] = [
        Role::User,
        Role::Premium,
        Role::Support,
        Role::SeniorSupport,
        Role::Moderator,
        Role::Admin,
        Role::Owner,
    ];

    /// Position in the hierarchy, 0 being least privileged.
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Premium => "Premium",
            Role::Support => "Support",
            Role::SeniorSupport => "Senior Support",
            Role::Moderator => "Moderator",
            Role::Admin => "Admin",
            Role::Owner => "Owner",
        }
    }

    /// Parse a group label as stored on the platform.
    pub fn from_label(label: &str) -> Result<Role, RoleError> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == label)
            .ok_or_else(|| RoleError::Unknown(label.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `group` parses to a tier ranking at or above at least one of
/// `required` (OR over the set). Unknown labels never qualify.
pub fn label_qualifies(group: &str, required: &[Role]) -> bool {
    match Role::from_label(group) {
        Ok(held) => required.iter().any(|role| held >= *role),
        Err(RoleError::Unknown(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_orders_lowest_to_highest() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::Moderator);
        assert!(Role::Moderator > Role::SeniorSupport);
        assert!(Role::SeniorSupport > Role::Support);
        assert!(Role::Support > Role::Premium);
        assert!(Role::Premium > Role::User);
    }

    #[test]
    fn higher_tier_qualifies_for_lower_requirement() {
        for (i, required) in Role::ALL.iter().enumerate() {
            for held in &Role::ALL[i..] {
                assert!(
                    label_qualifies(held.as_str(), &[*required]),
                    "{held} should qualify for {required}"
                );
            }
        }
    }

    #[test]
    fn lower_tier_does_not_qualify() {
        assert!(!label_qualifies("Support", &[Role::SeniorSupport]));
        assert!(!label_qualifies("User", &[Role::Premium]));
    }

    #[test]
    fn requirement_set_is_or_not_and() {
        // Moderator ranks below Admin but at/above Support, so one match wins
        assert!(label_qualifies(
            "Moderator",
            &[Role::Admin, Role::Support]
        ));
    }

    #[test]
    fn support_fails_against_higher_set() {
        assert!(!label_qualifies(
            "Support",
            &[Role::Admin, Role::Owner, Role::SeniorSupport]
        ));
    }

    #[test]
    fn unknown_labels_never_qualify() {
        for label in ["", "support", "Root", "Super Admin"] {
            for required in Role::ALL {
                assert!(!label_qualifies(label, &[required]));
            }
        }
    }

    #[test]
    fn unknown_label_is_an_explicit_error() {
        assert_eq!(
            Role::from_label("Root"),
            Err(RoleError::Unknown("Root".to_string()))
        );
    }

    #[test]
    fn labels_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_label(role.as_str()), Ok(role));
        }
    }
}
