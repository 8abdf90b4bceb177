//! Lists one page of archived items through the service and prints the routed reply.
//!
//! ```bash
//! RUST_LOG=info cargo run -p trash-management -- --name "report*" --page 1 --page-size 25
//! ```

use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use topic_bus::PublishOptions;
use trash_management::config::ServiceConfig;
use trash_management::lifecycle::{setup_tracing, TrashSystem};
use trash_management::service::RequestKind;
use trash_management::transport::HttpTransport;
use tracing::{error, info};

const RESPONSE_TOPIC: &str = "CLI_QUERY";

#[derive(Debug, Parser)]
#[command(name = "trash-management", about = "Query archived items through the trash service")]
struct Args {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "TRASH_MANAGEMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Name filter, wildcards allowed
    #[arg(long)]
    name: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: u64,

    #[arg(long, default_value_t = 25)]
    page_size: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    let args = Args::parse();

    let config = ServiceConfig::load(args.config.as_deref())?;
    let transport = Arc::new(HttpTransport::new(&config)?);
    let timeout = Duration::from_secs(config.request_timeout_secs + 5);
    let request_topic = RequestKind::Query.topic(&config.topic_prefix);
    let scope = PublishOptions::with_scope(config.scope().map(str::to_string));

    let system = TrashSystem::start(config, transport);

    let (replies, mut received) = mpsc::unbounded_channel::<(bool, Value)>();
    let handles: Vec<_> = [(true, "_SUCCESS"), (false, "_FAILURE")]
        .into_iter()
        .map(|(ok, suffix)| {
            let replies = replies.clone();
            system
                .bus
                .subscribe(format!("{RESPONSE_TOPIC}{suffix}"), move |payload| {
                    let _ = replies.send((ok, payload.clone()));
                    Ok(())
                })
        })
        .collect();

    let mut filters = Vec::new();
    if let Some(name) = &args.name {
        filters.push(json!({ "name": "name", "value": name }));
    }
    let request = json!({
        "page": args.page,
        "pageSize": args.page_size,
        "dataFilters": filters,
        "responseTopic": RESPONSE_TOPIC,
    });
    info!(topic = %request_topic, page = args.page, page_size = args.page_size, "Querying archived items");
    system.bus.publish(&request_topic, &request, scope);

    match tokio::time::timeout(timeout, received.recv()).await {
        Ok(Some((true, body))) => println!("{}", serde_json::to_string_pretty(&body)?),
        Ok(Some((false, body))) => error!(%body, "Query failed"),
        Ok(None) | Err(_) => error!("No reply before timeout"),
    }

    for handle in &handles {
        system.bus.unsubscribe(handle);
    }
    system.shutdown().await?;
    Ok(())
}
