//! User records as returned by the platform API, plus the ban-window check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A platform user: the session identity and every record on the admin list
/// share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub public_profile: bool,
    pub group: String,
    #[serde(default)]
    pub email_verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub banned_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ban_reason: Option<String>,
}

impl SessionUser {
    pub fn needs_verification(&self) -> bool {
        self.email_verified_at.is_none()
    }

    /// Echo a successful ban locally. Only the ban fields change.
    pub fn apply_ban(&mut self, reason: &str, banned_until: Option<DateTime<Utc>>) {
        self.ban_reason = Some(reason.to_string());
        self.banned_until = banned_until;
    }

    /// Echo a successful unban locally.
    pub fn apply_unban(&mut self) {
        self.ban_reason = None;
        self.banned_until = None;
    }

    /// Echo a successful group change locally.
    pub fn apply_group(&mut self, group: &str) {
        self.group = group.to_string();
    }

    /// Merge partial profile fields into this record.
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(bio) = &patch.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(nationality) = &patch.nationality {
            self.nationality = Some(nationality.clone());
        }
        if let Some(avatar_url) = &patch.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
        if let Some(public_profile) = patch.public_profile {
            self.public_profile = public_profile;
        }
        if let Some(group) = &patch.group {
            self.group = group.clone();
        }
    }
}

/// Partial profile update, merged field-by-field into a held identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub nationality: Option<String>,
    pub avatar_url: Option<String>,
    pub public_profile: Option<bool>,
    pub group: Option<String>,
}

/// The one ban-window check: banned iff `banned_until` is set and strictly
/// in the future at `now`. Never cached; callers re-evaluate per query so a
/// ban that expires mid-session reads as lifted on the next call.
pub fn is_banned_at(user: &SessionUser, now: DateTime<Utc>) -> bool {
    match user.banned_until {
        Some(until) => until > now,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> SessionUser {
        SessionUser {
            id: 42,
            name: "Nia".to_string(),
            email: "nia@example.com".to_string(),
            bio: Some("hi".to_string()),
            nationality: Some("NL".to_string()),
            avatar_url: None,
            public_profile: true,
            group: "Support".to_string(),
            email_verified_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            banned_until: None,
            ban_reason: None,
        }
    }

    #[test]
    fn not_banned_without_ban_fields() {
        let user = sample_user();
        assert!(!is_banned_at(&user, Utc::now()));
    }

    #[test]
    fn banned_while_window_is_open() {
        let mut user = sample_user();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        user.apply_ban("spam", Some(now + chrono::Duration::hours(1)));
        assert!(is_banned_at(&user, now));
    }

    #[test]
    fn ban_lifts_once_the_instant_passes() {
        let mut user = sample_user();
        let until = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        user.apply_ban("old", Some(until));
        // Strict comparison: exactly at the boundary is no longer banned
        assert!(!is_banned_at(&user, until));
        assert!(!is_banned_at(
            &user,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        ));
        // Same record evaluated before the boundary still reads banned
        assert!(is_banned_at(
            &user,
            Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap()
        ));
    }

    #[test]
    fn open_ended_ban_has_no_window() {
        let mut user = sample_user();
        user.apply_ban("permanent", None);
        assert!(!is_banned_at(&user, Utc::now()));
        assert_eq!(user.ban_reason.as_deref(), Some("permanent"));
    }

    #[test]
    fn ban_patch_touches_only_ban_fields() {
        let before = sample_user();
        let mut after = before.clone();
        let until = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        after.apply_ban("abuse", Some(until));

        assert_eq!(after.ban_reason.as_deref(), Some("abuse"));
        assert_eq!(after.banned_until, Some(until));
        assert_eq!(after.name, before.name);
        assert_eq!(after.email, before.email);
        assert_eq!(after.bio, before.bio);
        assert_eq!(after.group, before.group);
        assert_eq!(after.public_profile, before.public_profile);
    }

    #[test]
    fn unban_clears_both_ban_fields() {
        let mut user = sample_user();
        user.apply_ban("x", Some(Utc::now() + chrono::Duration::days(1)));
        user.apply_unban();
        assert_eq!(user.banned_until, None);
        assert_eq!(user.ban_reason, None);
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut user = sample_user();
        user.apply_patch(&UserPatch {
            bio: Some("new bio".to_string()),
            public_profile: Some(false),
            ..Default::default()
        });
        assert_eq!(user.bio.as_deref(), Some("new bio"));
        assert!(!user.public_profile);
        assert_eq!(user.name, "Nia");
        assert_eq!(user.group, "Support");
    }
}
