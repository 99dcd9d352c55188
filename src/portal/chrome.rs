use serde::Serialize;

use crate::database::models::{Role, ThemePreference, UserProfile};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    /// None for groups that only expand
    pub href: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

impl NavItem {
    const fn link(label: &'static str, href: &'static str) -> Self {
        Self {
            label,
            href: Some(href),
            children: Vec::new(),
        }
    }

    fn group(label: &'static str, children: Vec<NavItem>) -> Self {
        Self {
            label,
            href: None,
            children,
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.href.map(|href| href.split('#').next() == Some(path)).unwrap_or(false)
            || self.children.iter().any(|child| child.contains(path))
    }
}

/// Colour scheme applied to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeScheme {
    pub name: ThemePreference,
    pub label: &'static str,
    pub gradient_from: &'static str,
    pub gradient_to: &'static str,
}

impl ThemeScheme {
    pub fn for_preference(preference: ThemePreference) -> Self {
        let (label, gradient_from, gradient_to) = match preference {
            ThemePreference::Modern => ("Modern & Focused", "#6a11cb", "#2575fc"),
            ThemePreference::Warm => ("Warm & Creative", "#c05b41", "#d4af37"),
            ThemePreference::Classic => ("Classic & Literary", "#001f3f", "#800020"),
        };
        Self {
            name: preference,
            label,
            gradient_from,
            gradient_to,
        }
    }

    pub fn css_gradient(&self) -> String {
        format!("linear-gradient(45deg, {}, {})", self.gradient_from, self.gradient_to)
    }
}

/// The authenticated shell around protected pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chrome {
    pub display_name: String,
    pub nav: Vec<NavItem>,
    /// Footer links: settings, plus the admin entry for super admins
    pub footer: Vec<NavItem>,
    pub theme: ThemeScheme,
    /// The nav entry matching the current path, if any
    pub active: Option<String>,
}

impl Chrome {
    /// The Super Admin entry is only a hint; the admin routes check the
    /// role on the server.
    pub fn for_profile(profile: &UserProfile, path: &str) -> Self {
        let nav = main_navigation();
        let mut footer = vec![NavItem::link("Settings", "/settings")];
        if profile.role == Role::SuperAdmin {
            footer.push(NavItem::link("Super Admin", "/superadmin/dashboard"));
        }

        let active = nav
            .iter()
            .chain(footer.iter())
            .any(|item| item.contains(path))
            .then(|| path.to_string());

        Self {
            display_name: profile.display_name().to_string(),
            nav,
            footer,
            theme: ThemeScheme::for_preference(profile.theme_preference),
            active,
        }
    }
}

pub fn main_navigation() -> Vec<NavItem> {
    vec![
        NavItem::link("Dashboard", "/dashboard"),
        NavItem::group(
            "Insights Board",
            vec![
                NavItem::link("KDP Importer", "/insights-board"),
                NavItem::link("AI Blurb Grader", "/insights-board#ai-grader"),
            ],
        ),
        NavItem::link("Project Planner", "/project-planner"),
        NavItem::link("Story Forge", "/story-forge"),
        NavItem::link("ARC Hub", "/arc-hub"),
        NavItem::group(
            "Design Studio",
            vec![
                NavItem::link("Cover Calculator", "/cover-calculator"),
                NavItem::link("Creative Canvas", "/design-studio"),
            ],
        ),
        NavItem::link("Website Builder", "/website-builder"),
        NavItem::link("Team Connect", "/team-connect"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(role: Role, theme: ThemePreference) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            full_name: None,
            role,
            email: "a@x.com".into(),
            bio: None,
            genre: None,
            theme_preference: theme,
            created_at: None,
        }
    }

    #[test]
    fn super_admin_entry_only_for_super_admins() {
        let author = Chrome::for_profile(&profile(Role::Author, ThemePreference::Modern), "/dashboard");
        assert!(author.footer.iter().all(|item| item.label != "Super Admin"));

        let admin = Chrome::for_profile(&profile(Role::SuperAdmin, ThemePreference::Modern), "/dashboard");
        assert_eq!(admin.footer.last().and_then(|item| item.href), Some("/superadmin/dashboard"));
    }

    #[test]
    fn theme_follows_preference() {
        let chrome = Chrome::for_profile(&profile(Role::Author, ThemePreference::Warm), "/dashboard");
        assert_eq!(chrome.theme.label, "Warm & Creative");
        assert_eq!(chrome.theme.css_gradient(), "linear-gradient(45deg, #c05b41, #d4af37)");
        assert_eq!(chrome.display_name, "Author");
    }

    #[test]
    fn marks_active_entry_including_sub_items() {
        let chrome = Chrome::for_profile(&profile(Role::Author, ThemePreference::Modern), "/insights-board");
        assert_eq!(chrome.active.as_deref(), Some("/insights-board"));

        let chrome = Chrome::for_profile(&profile(Role::Author, ThemePreference::Modern), "/reader/dashboard");
        assert_eq!(chrome.active, None);
    }
}
