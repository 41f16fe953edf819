use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "silk-debug")]
#[command(about = "Talk to the silk-controller debug server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:17001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active log level, or set it (trace, debug, info, warn, error, fatal)
    LogLevel { level: Option<String> },
    /// Dump Prometheus metrics
    Metrics,
    /// Check that the debug server answers
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::LogLevel { level: None } => client.get(format!("{url}/log-level")).send().await?,
        Commands::LogLevel { level: Some(level) } => {
            client
                .post(format!("{url}/log-level"))
                .body(level)
                .send()
                .await?
        }
        Commands::Metrics => client.get(format!("{url}/metrics")).send().await?,
        Commands::Health => client.get(format!("{url}/healthz")).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: debug server returned status {}", status);
        eprintln!("Response: {}", text.trim_end());
        std::process::exit(1);
    }

    println!("{}", text.trim_end());
    Ok(())
}
