use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Application-level user record, one per authenticated subject.
///
/// `id` equals the session subject. `instance_id` is the tenant partition
/// key and never changes after the row is provisioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub instance_id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub theme_preference: ThemePreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Author",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Author,
    BetaReader,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "AUTHOR",
            Role::BetaReader => "BETA_READER",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTHOR" => Ok(Role::Author),
            "BETA_READER" => Ok(Role::BetaReader),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Modern,
    Warm,
    Classic,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [ThemePreference::Modern, ThemePreference::Warm, ThemePreference::Classic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Modern => "modern",
            ThemePreference::Warm => "warm",
            ThemePreference::Classic => "classic",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(ThemePreference::Modern),
            "warm" => Ok(ThemePreference::Warm),
            "classic" => Ok(ThemePreference::Classic),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_backend_row() {
        let row = json!({
            "id": "7a0f6a64-51a9-4d5e-9d58-4b8e5f3f0c11",
            "instance_id": "0f7dfc53-8c5c-4d0a-9a4c-0c3a1a2b3c4d",
            "full_name": "Ada Quill",
            "role": "BETA_READER",
            "email": "ada@example.com",
            "bio": null,
            "genre": "Fantasy",
            "theme_preference": "warm",
            "created_at": "2025-03-01T10:00:00.123456+00:00"
        });
        let profile: UserProfile = serde_json::from_value(row).unwrap();
        assert_eq!(profile.role, Role::BetaReader);
        assert_eq!(profile.theme_preference, ThemePreference::Warm);
        assert_eq!(profile.display_name(), "Ada Quill");
    }

    #[test]
    fn blank_name_falls_back_to_author() {
        let profile = UserProfile {
            id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            full_name: Some("  ".into()),
            role: Role::Author,
            email: "a@x.com".into(),
            bio: None,
            genre: None,
            theme_preference: ThemePreference::default(),
            created_at: None,
        };
        assert_eq!(profile.display_name(), "Author");
    }

    #[test]
    fn parses_roles_and_themes_case_insensitively() {
        assert_eq!("super_admin".parse::<Role>(), Ok(Role::SuperAdmin));
        assert!("EDITOR".parse::<Role>().is_err());
        assert_eq!("Classic".parse::<ThemePreference>(), Ok(ThemePreference::Classic));
    }
}
