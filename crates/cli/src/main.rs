//! ezyQ CLI - Command-line client for the queue engine daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9627";

#[derive(Parser)]
#[command(name = "ezyq")]
#[command(about = "ezyQ queue engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "EZYQ_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new queue for a business
    CreateQueue {
        /// Owning business ID
        #[arg(short, long)]
        business: String,

        /// Queue name
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Maximum live entries (default 50)
        #[arg(long)]
        max_capacity: Option<i32>,

        /// Average minutes per customer (default 10)
        #[arg(long)]
        avg_service_time: Option<i32>,
    },

    /// Join a queue
    Join {
        queue_id: String,
        user_id: String,

        /// Priority (higher = served first, -100..=100)
        #[arg(short, long, default_value = "0")]
        priority: i32,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a user's position in a queue
    Position { queue_id: String, user_id: String },

    /// Call the next waiting entry
    CallNext { queue_id: String },

    /// Cancel an entry
    Cancel { entry_id: String },

    /// Mark a called entry as served
    Complete { entry_id: String },

    /// Mark a called entry as a no-show
    NoShow { entry_id: String },

    /// Show queue statistics
    Stats { queue_id: String },

    /// Show statistics across a business's queues
    BusinessStats { business_id: String },

    /// Run maintenance (purge old terminal entries, VACUUM when large)
    Maintenance,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    id: String,
    name: String,
    status: String,
    max_capacity: i32,
    current_capacity: i32,
    avg_service_time: i32,
}

#[derive(Deserialize, Tabled)]
struct EntryRow {
    id: String,
    queue_id: String,
    user_id: String,
    ticket_number: i64,
    priority: i32,
    status: String,
}

#[derive(Deserialize, Tabled)]
struct QueueStatsRow {
    queue_id: String,
    waiting_count: i64,
    avg_wait_minutes: i64,
    total_served: i64,
    utilization_percent: u32,
}

#[derive(Deserialize, Tabled)]
struct BusinessStatsRow {
    business_id: String,
    total_queues: i64,
    active_queues: i64,
    total_customers: i64,
    total_served: i64,
}

async fn call_rpc(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn colored_status(status: &str) -> ColoredString {
    match status {
        "waiting" | "active" => status.green(),
        "called" | "paused" => status.yellow(),
        "served" => status.cyan(),
        "cancelled" | "no_show" | "closed" => status.red(),
        other => other.normal(),
    }
}

fn print_entry(title: &str, value: Value) -> Result<()> {
    let entry: EntryRow = serde_json::from_value(value)?;
    println!(
        "{} {}",
        format!("✓ {}", title).green().bold(),
        colored_status(&entry.status)
    );
    println!();
    println!("{}", Table::new(vec![entry]));
    Ok(())
}

fn mb(bytes: &Value) -> f64 {
    bytes.as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::CreateQueue {
            business,
            name,
            category,
            location,
            max_capacity,
            avg_service_time,
        } => {
            let params = json!({
                "business_id": business,
                "name": name,
                "category": category,
                "location": location,
                "max_capacity": max_capacity,
                "avg_service_time": avg_service_time,
            });

            let result = call_rpc(url, "queue.create.v1", params).await?;
            let queue: QueueRow = serde_json::from_value(result)?;

            println!("{}", "✓ Queue created".green().bold());
            println!();
            println!("{}", Table::new(vec![queue]));
        }

        Commands::Join {
            queue_id,
            user_id,
            priority,
            notes,
        } => {
            let params = json!({
                "queue_id": queue_id,
                "user_id": user_id,
                "priority": priority,
                "notes": notes,
            });

            let result = call_rpc(url, "queue.join.v1", params).await?;
            let wait = result["estimated_wait_time"].clone();
            print_entry("Joined queue", result)?;
            println!("  {} {} min", "Estimated wait:".bold(), wait);
        }

        Commands::Position { queue_id, user_id } => {
            let params = json!({ "queue_id": queue_id, "user_id": user_id });
            let result = call_rpc(url, "queue.position.v1", params).await?;

            match result["rank"].as_i64() {
                Some(rank) if rank > 0 => {
                    println!("  {} {}", "Position:".bold(), rank.to_string().cyan());
                    println!(
                        "  {} {} min",
                        "Estimated wait:".bold(),
                        result["estimated_wait_minutes"]
                    );
                }
                _ => println!("{}", format!("{} is not waiting in {}", user_id, queue_id).yellow()),
            }
        }

        Commands::CallNext { queue_id } => {
            let result = call_rpc(url, "queue.call_next.v1", json!({ "queue_id": queue_id })).await?;

            match result.get("entry") {
                Some(entry) if !entry.is_null() => print_entry("Called", entry.clone())?,
                _ => println!("{}", "Nobody is waiting".yellow()),
            }
        }

        Commands::Cancel { entry_id } => {
            let result = call_rpc(url, "entry.cancel.v1", json!({ "entry_id": entry_id })).await?;
            print_entry("Entry cancelled", result)?;
        }

        Commands::Complete { entry_id } => {
            let result =
                call_rpc(url, "entry.complete.v1", json!({ "entry_id": entry_id })).await?;
            print_entry("Entry served", result)?;
        }

        Commands::NoShow { entry_id } => {
            let result = call_rpc(url, "entry.no_show.v1", json!({ "entry_id": entry_id })).await?;
            print_entry("Entry marked no-show", result)?;
        }

        Commands::Stats { queue_id } => {
            let result = call_rpc(url, "queue.stats.v1", json!({ "queue_id": queue_id })).await?;
            let stats: QueueStatsRow = serde_json::from_value(result)?;

            println!("{}", "Queue Statistics".cyan().bold());
            println!();
            println!("{}", Table::new(vec![stats]));
        }

        Commands::BusinessStats { business_id } => {
            let result =
                call_rpc(url, "business.stats.v1", json!({ "business_id": business_id })).await?;
            let stats: BusinessStatsRow = serde_json::from_value(result)?;

            println!("{}", "Business Statistics".cyan().bold());
            println!();
            println!("{}", Table::new(vec![stats]));
        }

        Commands::Maintenance => {
            println!("{}", "Running maintenance...".cyan().bold());
            println!();

            match call_rpc(url, "admin.maintenance.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} Maintenance completed", "✓".green());
                    println!();
                    println!("  {} {}", "Queues:".bold(), stats["queue_count"]);
                    println!("  {} {}", "Entries:".bold(), stats["entry_count"]);
                    println!("  {} {}", "Terminal entries:".bold(), stats["terminal_entry_count"]);
                    println!("  {} {}", "History rows:".bold(), stats["history_count"]);
                    println!("  {} {:.2} MB", "DB Size:".bold(), mb(&stats["db_size_bytes"]));
                }
                Err(e) => {
                    println!("  {} Maintenance failed: {}", "✗".red(), e);
                }
            }
        }
    }

    Ok(())
}
