use clap::Parser;
use colored::Colorize;
use keycop::cli::{Cli, Commands, OutputFormatter};
use keycop::core::{Config, ProbeOutcome};
use keycop::platform::GitHubClient;
use keycop::providers::ProviderRegistry;
use keycop::store::JsonStore;
use keycop::{Notifier, Searcher, Verifier};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env file if it exists
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .init();

    OutputFormatter::print_banner();

    if let Err(e) = run(cli.command).await {
        OutputFormatter::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> keycop::Result<()> {
    let config = Config::load()?;
    let registry = Arc::new(ProviderRegistry::with_default_providers());

    match command {
        Commands::Search { key_type } => {
            OutputFormatter::print_ethical_warning();

            let client = Arc::new(github_client(&config)?);
            let store = Arc::new(JsonStore::open(&config.storage.leaked_keys)?);

            let searcher = Searcher::new(registry, client, store, config.search.clone());
            let summary = searcher.search_leaked_keys(&key_type).await?;

            OutputFormatter::print_search_summary(&key_type, &summary);
        }

        Commands::Verify => {
            let store = Arc::new(JsonStore::open(&config.storage.leaked_keys)?);
            let valid_store = Arc::new(JsonStore::open(&config.storage.valid_keys)?);

            let verifier = Verifier::new(registry, store, valid_store, &config.verify);
            let summary = verifier.run_verification().await?;

            OutputFormatter::print_verify_summary(&summary);
        }

        Commands::Notify { repo, dry_run } => {
            let client = Arc::new(github_client(&config)?);
            let valid_store = Arc::new(JsonStore::open(&config.storage.valid_keys)?);

            let notifier = Notifier::new(client, valid_store, dry_run);
            let summary = notifier.run_notification(repo.as_deref()).await?;

            OutputFormatter::print_notify_summary(&summary);
        }

        Commands::Test { key, key_type } => {
            let provider = registry.resolve(&key_type)?;
            OutputFormatter::print_info(&format!("Probing {} key...", provider.key_type()));

            match provider.probe(&key).await? {
                ProbeOutcome::Success => {
                    OutputFormatter::print_success("Key is LIVE");
                }
                ProbeOutcome::AuthRejected => {
                    OutputFormatter::print_info("Key was rejected (revoked or never valid)");
                }
                ProbeOutcome::Other(reason) => {
                    OutputFormatter::print_error(&format!("Probe inconclusive: {}", reason));
                }
            }
        }

        Commands::List => {
            println!("{}", "Registered providers:".bright_cyan().bold());
            for provider in registry.iter() {
                println!(
                    "  {} {}  query: {}",
                    "-".bright_yellow(),
                    provider.key_type().bright_white(),
                    provider.search_query().bright_black()
                );
            }
        }
    }

    Ok(())
}

fn github_client(config: &Config) -> keycop::Result<GitHubClient> {
    let token = config.github_token()?;
    Ok(GitHubClient::new(
        token,
        config.github.base_url.clone(),
        config.github.rate_limit_delay_ms,
    ))
}
