use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "monitor-cli")]
#[command(about = "Management CLI for the API monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest observation of every target
    Status,
    /// List registered targets
    Targets,
    /// Register a target (or update the expected status of a known URL)
    Add {
        url: String,
        #[arg(long)]
        expected: Option<u16>,
        #[arg(long)]
        slow_ms: Option<u64>,
    },
    /// Change the expected status or slow threshold of a target
    Update {
        target_id: i64,
        #[arg(long, required_unless_present = "slow_ms")]
        expected: Option<u16>,
        #[arg(long)]
        slow_ms: Option<u64>,
    },
    /// Recent observations of one target
    Checks {
        target_id: i64,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = request(&client, base, cli.command).send().await?;
    print_response(res).await
}

fn request(client: &reqwest::Client, base: &str, command: Commands) -> reqwest::RequestBuilder {
    match command {
        Commands::Status => client.get(format!("{}/status", base)),
        Commands::Targets => client.get(format!("{}/urls", base)),
        Commands::Add { url, expected, slow_ms } => client
            .post(format!("{}/urls", base))
            .json(&json!({ "url": url, "expected_status": expected, "slow_ms": slow_ms })),
        Commands::Update {
            target_id,
            expected,
            slow_ms,
        } => client
            .patch(format!("{}/urls/{}", base, target_id))
            .json(&json!({ "expected_status": expected, "slow_ms": slow_ms })),
        Commands::Checks { target_id, limit } => client
            .get(format!("{}/checks", base))
            .query(&[("url_id", target_id.to_string()), ("limit", limit.to_string())]),
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: monitor API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
