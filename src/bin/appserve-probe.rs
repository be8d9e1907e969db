use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;

#[derive(Parser)]
#[command(name = "appserve-probe")]
#[command(about = "Small client for poking a running appserve", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a path and print status, content type and body
    Get { path: String },
    /// Poll until the server answers
    Wait {
        #[arg(long, default_value = "/")]
        path: String,

        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Get { path } => {
            let res = client.get(target(&cli.url, &path)).send().await?;
            print_response(res).await?;
        }
        Commands::Wait { path, timeout_secs } => {
            let deadline = Instant::now() + Duration::from_secs(timeout_secs);
            let url = target(&cli.url, &path);
            loop {
                match client.get(&url).send().await {
                    Ok(res) => {
                        println!("up: {} answered {}", url, res.status());
                        break;
                    }
                    Err(e) if Instant::now() >= deadline => {
                        eprintln!("Error: {} did not answer within {}s: {}", url, timeout_secs, e);
                        std::process::exit(1);
                    }
                    Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
                }
            }
        }
    }

    Ok(())
}

fn target(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    println!("{}", status);
    println!("Content-Type: {}", content_type);

    let body = res.bytes().await?;
    match std::str::from_utf8(&body) {
        Ok(text) => println!("\n{}", text),
        Err(_) => println!("\n<{} bytes of binary content>", body.len()),
    }
    Ok(())
}
