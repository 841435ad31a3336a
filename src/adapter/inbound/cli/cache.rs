//! Handler for `cache` subcommands.

use serde_json::json;

use crate::adapter::inbound::cli::command::PurgeArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_query_service, Components};
use crate::infrastructure::config::Config;
use crate::port::inbound::query::DividendQuery;

/// Evict one key, or everything with `--all`.
pub async fn purge(config: &Config, args: &PurgeArgs) -> Result<()> {
    super::require_shared_cache(config, "cache purge")?;
    let components = Components::connect(config)?;
    let service = build_query_service(config, &components)?;

    let key = (!args.all).then(|| args.scope.key());
    let removed = service.purge(key.clone()).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "cache.purge",
            "cache": components.cache.name(),
            "key": key.map(|k| k.to_string()),
            "removed": removed,
        }));
        return Ok(());
    }

    let scope = key.map_or_else(|| "all entries".to_string(), |k| k.to_string());
    output::field("Cache", components.cache.name());
    output::field("Scope", &scope);
    if removed == 0 {
        output::hint("nothing was cached for this scope");
    } else {
        output::success(&format!("Removed {removed} cached entries"));
    }
    Ok(())
}
