use anyhow::Result;
use colored::Colorize;
use lexa_core::Template;

use crate::context::AppContext;
use crate::GlobalArgs;

pub async fn list(ctx: &AppContext, args: &GlobalArgs) -> Result<()> {
    let credential = ctx.credential(args).await?;
    let service = ctx.drafting_service(credential, None);

    let templates = service.try_list_templates().await?;
    if templates.is_empty() {
        println!("{}", "No contract templates available.".bright_black());
        return Ok(());
    }
    print_catalog(&templates);
    Ok(())
}

/// Prints the catalog numbered from 1, the numbers `find_template` accepts.
pub fn print_catalog(templates: &[Template]) {
    for (index, template) in templates.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            index + 1,
            template.name.bold(),
            format!("({}, id {})", template.filename, template.id).bright_black()
        );
    }
}
