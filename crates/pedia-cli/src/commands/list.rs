use pedia_core::Object;
use pedia_store::ListPage;
use serde_json::json;

use super::QueryArgs;
use crate::fixtures;

pub fn list(config: &str, fixtures_path: &str, kind: &str, query: &QueryArgs) -> anyhow::Result<()> {
    let storage = fixtures::open_storage(config, fixtures_path, kind)?;
    let options = query.builder()?.options();
    let page: ListPage<Object> = storage.list(&options)?;

    tracing::debug!(
        kind,
        returned = page.items.len(),
        skipped = page.skipped,
        "list finished"
    );
    println!("{}", serde_json::to_string_pretty(&render(&page))?);
    Ok(())
}

fn render(page: &ListPage<Object>) -> serde_json::Value {
    json!({
        "items": page.items,
        "continue": page.continue_token,
        "remainingItemCount": page.remaining,
        "skipped": page.skipped,
    })
}
