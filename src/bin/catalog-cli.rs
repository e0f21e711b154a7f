use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ETAG, IF_NONE_MATCH};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Inspect caching behaviour of the catalog API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Send requests as this user (`X-User-Id`).
    #[arg(long)]
    user: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path and show status, caching headers and body
    Get { path: String },
    /// GET a path, then repeat it conditionally with the returned ETag
    Revalidate { path: String },
}

/// Response headers worth showing.
const CACHING_HEADERS: [&str; 5] = ["etag", "cache-control", "x-cache", "age", "x-request-id"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(user) = cli.user {
        headers.insert("x-user-id", HeaderValue::from(user));
    }

    match cli.command {
        Commands::Get { path } => {
            let res = client
                .get(format!("{}{}", cli.url, path))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Revalidate { path } => {
            let url = format!("{}{}", cli.url, path);
            let first = client.get(&url).headers(headers.clone()).send().await?;
            let Some(etag) = first.headers().get(ETAG).cloned() else {
                return Err(format!("{} returned no ETag (status {})", path, first.status()).into());
            };
            println!("first:  {} etag={}", first.status(), etag.to_str().unwrap_or("?"));

            headers.insert(IF_NONE_MATCH, etag);
            let second = client.get(&url).headers(headers).send().await?;
            println!("second: {}", second.status());
            print_response(second).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("status: {}", status);
    for name in CACHING_HEADERS {
        if let Some(value) = res.headers().get(name) {
            println!("{}: {}", name, value.to_str().unwrap_or("?"));
        }
    }

    let text = res.text().await?;
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
