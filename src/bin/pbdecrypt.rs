use std::process;
use std::time::Duration;

use clap::Parser;
use pbdecrypt::payload::message_body;
use pbdecrypt::{filter_links, DecryptedPaste, DecryptionError, FetchConfig, HttpFetcher, PasteClient};

/// Decrypt a PrivateBin paste link and print the links it contains.
#[derive(Parser, Debug)]
#[command(author, version = env!("PBDECRYPT_VERSION"), about)]
struct Cli {
    /// Paste link, including the #key fragment.
    paste_url: String,

    /// Only print links containing this keyword (case-insensitive).
    #[arg(long)]
    filter: Option<String>,

    /// Print the decrypted paste text instead of its links.
    #[arg(long, conflicts_with_all = ["json", "filter"])]
    text: bool,

    /// Print the links as a JSON array.
    #[arg(long)]
    json: bool,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// How often to retry rate-limited or failing requests.
    #[arg(long)]
    retries: Option<u32>,

    /// User-Agent header sent to the paste server.
    #[arg(long)]
    user_agent: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(output) if output.is_empty() => eprintln!("No links found."),
        Ok(output) => println!("{}", output),
        Err(error) => {
            eprintln!("error [{}]: {}", error.kind(), error);
            process::exit(1);
        }
    }
}

fn fetch_config(cli: &Cli) -> FetchConfig {
    let mut config = FetchConfig::from_env();
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = cli.retries {
        config.max_retries = retries;
    }
    if let Some(user_agent) = cli.user_agent.as_deref().filter(|ua| !ua.trim().is_empty()) {
        config.user_agent = user_agent.to_string();
    }
    config
}

fn execute(cli: Cli) -> Result<String, DecryptionError> {
    let fetcher = HttpFetcher::new(fetch_config(&cli))?;
    let paste = PasteClient::new(fetcher).open(&cli.paste_url)?;
    Ok(render(&cli, &paste))
}

fn render(cli: &Cli, paste: &DecryptedPaste) -> String {
    if cli.text {
        return message_body(&paste.text);
    }

    let links = match cli.filter.as_deref() {
        Some(keyword) => filter_links(&paste.urls, keyword),
        None => paste.urls.clone(),
    };

    if cli.json {
        return format!("{:#}", serde_json::Value::from(links));
    }
    links.join("\n")
}
