use chrono::{Local, Timelike};
use serde::Serialize;

use crate::database::models::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickLink {
    pub title: &'static str,
    pub description: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub headline: String,
    pub quick_links: Vec<QuickLink>,
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

pub fn dashboard_at(profile: &UserProfile, hour: u32) -> Dashboard {
    Dashboard {
        headline: format!("{}, {}!", greeting(hour), profile.display_name()),
        quick_links: vec![
            QuickLink {
                title: "Start a New Project",
                description: "Begin your next bestseller.",
                href: "/story-forge",
            },
            QuickLink {
                title: "Manage Beta Readers",
                description: "Post opportunities and review applicants.",
                href: "/arc-hub",
            },
            QuickLink {
                title: "Plan Your Tasks",
                description: "Organize your writing and marketing schedule.",
                href: "/project-planner",
            },
        ],
    }
}

/// The dashboard as of the local wall clock.
pub fn dashboard(profile: &UserProfile) -> Dashboard {
    dashboard_at(profile, Local::now().hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Role, ThemePreference};
    use uuid::Uuid;

    fn profile(full_name: Option<&str>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            full_name: full_name.map(str::to_string),
            role: Role::Author,
            email: "a@x.com".into(),
            bio: None,
            genre: None,
            theme_preference: ThemePreference::Modern,
            created_at: None,
        }
    }

    #[test]
    fn greeting_boundaries() {
        assert_eq!(greeting(0), "Good morning");
        assert_eq!(greeting(11), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(17), "Good afternoon");
        assert_eq!(greeting(18), "Good evening");
        assert_eq!(greeting(23), "Good evening");
    }

    #[test]
    fn headline_falls_back_to_author() {
        assert_eq!(dashboard_at(&profile(Some("Ada Quill")), 9).headline, "Good morning, Ada Quill!");
        assert_eq!(dashboard_at(&profile(None), 20).headline, "Good evening, Author!");
    }
}
