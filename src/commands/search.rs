// Search command for querying one or all repositories

use crate::commands::{self, Context};
use crate::sources::{SearchOptions, search};
use crate::ui;

pub async fn search(ctx: &Context, query: String, repo: Option<String>) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query must not be empty");
    }

    let options = SearchOptions::with_loaders(commands::manifest_loaders());
    let pb = ui::spinner(&format!("Searching for {}...", query));

    let results = match repo {
        Some(id) => {
            let repository = ctx.registry.get_or_error(&id)?;
            match repository.search(query, &options).await {
                Ok(results) => results,
                Err(e) => {
                    ui::finish_spinner_error(&pb, &format!("Search in {} failed", id));
                    return Err(e.into());
                }
            }
        }
        None => ctx.registry.search_all(query, &options).await,
    };
    ui::clear_bar(&pb);

    let mut results = results;
    search::rank_search_results_stable(&mut results, query);

    if results.is_empty() {
        ui::warning(&format!("No results for '{}'", query));
        return Ok(());
    }

    for result in &results {
        ui::status(
            &format!("{}:{}", result.source, result.id),
            &format!(
                "{} {} by {} ({} downloads)",
                result.name, result.version, result.author, result.downloads
            ),
        );
        if !result.description.is_empty() {
            ui::dim(&format!("  {}", result.description));
        }
    }
    Ok(())
}
