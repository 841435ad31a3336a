//! Handler for the `query` command.

use serde_json::json;

use crate::adapter::inbound::cli::command::QueryArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::Dividends;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_query_service, Components};
use crate::infrastructure::config::Config;
use crate::port::inbound::query::{DividendQuery, QueryRequest, QueryResponse};

/// Execute the query command.
pub async fn execute(config: &Config, args: &QueryArgs) -> Result<()> {
    if args.trade {
        super::require_shared_queue(config, "query --trade")?;
    }
    let components = Components::connect(config)?;
    let service = build_query_service(config, &components)?;

    let response = if args.no_cache {
        service.query_uncached(args.scope.key()).await?
    } else {
        let request = QueryRequest::new(args.scope.subnet, args.scope.account.clone())
            .with_trade(args.trade);
        service.query(request).await?
    };
    service.settle().await;

    if output::is_json() {
        output::json_output(json!(response));
        return Ok(());
    }

    render(&response, args.trade);
    Ok(())
}

fn render(response: &QueryResponse, trade_requested: bool) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field(
        "Subnet",
        response
            .subnet_id
            .map_or_else(|| "all".to_string(), |id| id.to_string()),
    );
    output::field("Account", response.account_id.as_deref().unwrap_or("all"));
    output::field("Observed", response.timestamp.to_rfc3339());
    output::field(
        "Source",
        if response.cached {
            output::muted("cache")
        } else {
            output::highlight("upstream")
        },
    );

    match &response.dividend {
        Dividends::Single(record) => output::field("Dividend", output::positive(record.value)),
        Dividends::Aggregate(records) => {
            output::section(&format!("Dividends ({})", records.len()));
            for record in records {
                output::field(
                    &format!("netuid {}", record.subnet_id),
                    format!("{} {}", record.account_id, output::positive(record.value)),
                );
            }
        }
    }

    if trade_requested {
        if response.trade_enqueued {
            output::success("Trade job queued");
        } else {
            output::warning("Trade job could not be queued");
        }
    }
}
