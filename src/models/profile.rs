// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Student and tutor profiles.
//!
//! Both carry denormalized flag fields (`has_apple_id`, ...) stored as
//! `"1"`/`"-1"`, because the search index cannot filter on the absence
//! of a field.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Presence flag with the sentinel wire values `"1"` and `"-1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Flag {
    #[serde(rename = "1")]
    Yes,
    #[serde(rename = "-1")]
    No,
}

impl Flag {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Flag::Yes
        } else {
            Flag::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Yes => "1",
            Flag::No => "-1",
        }
    }
}

/// The four denormalized flags, as written back onto a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFlags {
    pub has_apple_id: Flag,
    pub has_facebook_id: Flag,
    pub has_google_id: Flag,
    pub is_deleted: Flag,
}

impl ProfileFlags {
    /// Firestore field paths written by a flag update.
    pub const FIELDS: [&'static str; 4] =
        ["has_apple_id", "has_facebook_id", "has_google_id", "is_deleted"];
}

/// Which profile collection a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Students,
    Tutors,
}

impl ProfileKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ProfileKind::Students => crate::db::collections::STUDENTS,
            ProfileKind::Tutors => crate::db::collections::TUTORS,
        }
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "students" => Ok(ProfileKind::Students),
            "tutors" => Ok(ProfileKind::Tutors),
            other => Err(format!("unknown profile collection: {other}")),
        }
    }
}

/// Access to the fields the flags are derived from.
pub trait LinkedAccounts {
    fn apple_id(&self) -> Option<&str>;
    fn facebook_id(&self) -> Option<&str>;
    fn google_id(&self) -> Option<&str>;
    fn deleted_at(&self) -> Option<&str>;
    /// Flags as currently stored (`None` if any is missing).
    fn stored_flags(&self) -> Option<ProfileFlags>;
    fn set_flags(&mut self, flags: ProfileFlags);
}

/// Student profile stored in `students/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Student {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub apple_id: Option<String>,
    #[serde(default)]
    pub facebook_id: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub has_apple_id: Option<Flag>,
    #[serde(default)]
    pub has_facebook_id: Option<Flag>,
    #[serde(default)]
    pub has_google_id: Option<Flag>,
    #[serde(default)]
    pub is_deleted: Option<Flag>,
    #[serde(default)]
    pub created_at: String,
}

/// Tutor profile stored in `tutors/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Tutor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub apple_id: Option<String>,
    #[serde(default)]
    pub facebook_id: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub has_apple_id: Option<Flag>,
    #[serde(default)]
    pub has_facebook_id: Option<Flag>,
    #[serde(default)]
    pub has_google_id: Option<Flag>,
    #[serde(default)]
    pub is_deleted: Option<Flag>,
    #[serde(default)]
    pub created_at: String,
}

macro_rules! impl_linked_accounts {
    ($ty:ty) => {
        impl LinkedAccounts for $ty {
            fn apple_id(&self) -> Option<&str> {
                self.apple_id.as_deref()
            }
            fn facebook_id(&self) -> Option<&str> {
                self.facebook_id.as_deref()
            }
            fn google_id(&self) -> Option<&str> {
                self.google_id.as_deref()
            }
            fn deleted_at(&self) -> Option<&str> {
                self.deleted_at.as_deref()
            }
            fn stored_flags(&self) -> Option<ProfileFlags> {
                Some(ProfileFlags {
                    has_apple_id: self.has_apple_id?,
                    has_facebook_id: self.has_facebook_id?,
                    has_google_id: self.has_google_id?,
                    is_deleted: self.is_deleted?,
                })
            }
            fn set_flags(&mut self, flags: ProfileFlags) {
                self.has_apple_id = Some(flags.has_apple_id);
                self.has_facebook_id = Some(flags.has_facebook_id);
                self.has_google_id = Some(flags.has_google_id);
                self.is_deleted = Some(flags.is_deleted);
            }
        }
    };
}

impl_linked_accounts!(Student);
impl_linked_accounts!(Tutor);

impl Student {
    pub fn is_active(&self) -> bool {
        self.deleted_at.as_deref().map_or(true, str::is_empty)
    }
}

impl Tutor {
    pub fn is_active(&self) -> bool {
        self.deleted_at.as_deref().map_or(true, str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_sentinels() {
        assert_eq!(serde_json::to_string(&Flag::Yes).unwrap(), "\"1\"");
        assert_eq!(serde_json::to_string(&Flag::No).unwrap(), "\"-1\"");

        let student: Student = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "has_apple_id": "1",
            "is_deleted": "-1"
        }))
        .unwrap();
        assert_eq!(student.has_apple_id, Some(Flag::Yes));
        assert_eq!(student.is_deleted, Some(Flag::No));
        assert!(student.stored_flags().is_none());
    }

    #[test]
    fn test_profile_kind_parsing() {
        assert_eq!("tutors".parse::<ProfileKind>(), Ok(ProfileKind::Tutors));
        assert!("teachers".parse::<ProfileKind>().is_err());
    }
}
