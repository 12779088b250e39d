use std::time::Instant;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Command-line client for the game catalog server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every record of a resource
    List { resource: String },
    /// Fetch one record
    Get { resource: String, id: u64 },
    /// Create a record from a JSON document
    Create { resource: String, json: String },
    /// Replace a record with a JSON document
    Update {
        resource: String,
        id: u64,
        json: String,
    },
    /// Delete a record
    Delete { resource: String, id: u64 },
    /// Run the disconnect handshake
    Disconnect,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::List { resource } => {
            let res = client.get(format!("{base}/{resource}")).send().await?;
            print_response(res).await?;
        }
        Commands::Get { resource, id } => {
            let res = client.get(format!("{base}/{resource}/{id}")).send().await?;
            print_response(res).await?;
        }
        Commands::Create { resource, json } => {
            let body = parse_document(&json)?;
            let res = client
                .post(format!("{base}/{resource}"))
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Update { resource, id, json } => {
            let body = parse_document(&json)?;
            let res = client
                .put(format!("{base}/{resource}/{id}"))
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { resource, id } => {
            let res = client
                .delete(format!("{base}/{resource}/{id}"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Disconnect => {
            let started = Instant::now();
            let res = client.post(format!("{base}/disconnect")).send().await?;
            let status = res.status();
            let text = res.text().await?;
            println!("{status} {text} ({} ms)", started.elapsed().as_millis());
        }
    }

    Ok(())
}

/// Validate locally so a typo fails before it reaches the server.
fn parse_document(json: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    serde_json::to_string(&value)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
