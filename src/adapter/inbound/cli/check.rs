//! Handler for `check` subcommands.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::cache::CacheBackend;
use crate::infrastructure::config::llm::LlmProvider;
use crate::infrastructure::config::upstream::QuoteSource;
use crate::infrastructure::config::Config;

/// Environment variables the configuration needs, with whether each is set.
#[must_use]
pub fn required_secrets(config: &Config) -> Vec<(&'static str, bool)> {
    let mut vars = vec!["DATURA_API_KEY"];
    vars.push(match config.llm.provider {
        LlmProvider::Chutes => "CHUTES_API_KEY",
        LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        LlmProvider::OpenAi => "OPENAI_API_KEY",
    });
    vars.into_iter()
        .map(|var| {
            let present = std::env::var(var).is_ok_and(|v| !v.is_empty());
            (var, present)
        })
        .collect()
}

/// Validate the configuration file without starting anything.
pub fn config(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    let secrets = required_secrets(&config);

    let cache = match config.cache.backend {
        CacheBackend::Memory => "memory".to_string(),
        CacheBackend::Redis => format!("redis ({})", config.cache.redis_url),
    };
    let upstream = match config.upstream.source {
        QuoteSource::Gateway => format!("gateway ({})", config.upstream.gateway_url),
        QuoteSource::Simulated => "simulated".to_string(),
    };

    if output::is_json() {
        let missing: Vec<&str> = secrets
            .iter()
            .filter(|(_, present)| !present)
            .map(|(var, _)| *var)
            .collect();
        output::json_output(json!({
            "command": "check.config",
            "config": path.display().to_string(),
            "valid": true,
            "cache": cache,
            "upstream": upstream,
            "ttl_secs": config.cache.ttl_secs,
            "dry_run": config.trading.dry_run,
            "missing_secrets": missing,
        }));
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Cache", &cache);
    output::field("TTL", format!("{}s", config.cache.ttl_secs));
    output::field("Upstream", &upstream);
    output::field("Unit", format!("{} TAO", config.trading.unit_amount));
    output::field("Dry run", config.trading.dry_run);

    for (var, present) in secrets {
        if present {
            output::success(&format!("{var} is set"));
        } else {
            output::warning(&format!("{var} is not set (required by `taodiv worker`)"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_follow_llm_provider() {
        let mut config = Config::default();
        config.llm.provider = LlmProvider::Anthropic;
        let vars: Vec<&str> = required_secrets(&config).into_iter().map(|(v, _)| v).collect();
        assert_eq!(vars, vec!["DATURA_API_KEY", "ANTHROPIC_API_KEY"]);
    }
}
