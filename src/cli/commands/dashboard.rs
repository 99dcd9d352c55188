use crate::cli::utils::output_record;
use crate::cli::CliContext;
use crate::portal::pages::dashboard::dashboard;

pub async fn handle(ctx: &CliContext) -> anyhow::Result<()> {
    let page = ctx.page()?;
    let view = dashboard(page.profile());

    let mut lines = vec![("Welcome", view.headline.clone())];
    for link in &view.quick_links {
        lines.push((link.title, format!("{} ({})", link.description, link.href)));
    }
    output_record(&ctx.output, "dashboard", &view, &lines)
}
