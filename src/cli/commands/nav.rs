use serde_json::json;

use crate::cli::utils::output_record;
use crate::cli::CliContext;
use crate::portal::chrome::NavItem;
use crate::portal::RouteDecision;

fn nav_lines(items: &[NavItem], depth: usize, active: Option<&str>, out: &mut Vec<String>) {
    for item in items {
        let marker = match (item.href, active) {
            (Some(href), Some(active)) if href == active => "*",
            _ => " ",
        };
        let href = item.href.map(|h| format!(" ({})", h)).unwrap_or_default();
        out.push(format!("{}{} {}{}", "  ".repeat(depth), marker, item.label, href));
        nav_lines(&item.children, depth + 1, active, out);
    }
}

pub async fn handle(path: &str, ctx: &CliContext) -> anyhow::Result<()> {
    let decision = ctx.portal.navigate(path).await;

    let (record, lines) = match &decision {
        RouteDecision::Bare => (json!({ "layout": "bare", "path": path }), vec![("Layout", "bare".to_string())]),
        RouteDecision::Loading => (json!({ "layout": "loading", "path": path }), vec![("Layout", "loading".to_string())]),
        RouteDecision::Redirect(to) => (
            json!({ "layout": "redirect", "path": path, "redirect_to": to }),
            vec![("Layout", "redirect".to_string()), ("Redirect", to.clone())],
        ),
        RouteDecision::Chrome(chrome) => {
            let mut menu = Vec::new();
            nav_lines(&chrome.nav, 0, chrome.active.as_deref(), &mut menu);
            nav_lines(&chrome.footer, 0, chrome.active.as_deref(), &mut menu);
            (
                json!({ "layout": "chrome", "path": path, "chrome": chrome }),
                vec![
                    ("Layout", "chrome".to_string()),
                    ("User", chrome.display_name.clone()),
                    ("Theme", format!("{} {}", chrome.theme.label, chrome.theme.css_gradient())),
                    ("Menu", format!("\n{}", menu.join("\n"))),
                ],
            )
        }
    };

    output_record(&ctx.output, "navigation", &record, &lines)
}
