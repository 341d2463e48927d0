mod article;
mod artifact;
mod cli;
mod config;
mod crew;
mod delegate;
mod error;
mod frameworks;
mod status;
mod web;
mod workflow;

use article::{Topic, WordCount};
use artifact::ArtifactStore;
use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use error::CliError;
use tracing_subscriber::EnvFilter;
use workflow::{Toolbox, Workflow};

/// Keys shorter than this are almost certainly truncated or placeholders.
const MIN_API_KEY_LEN: usize = 20;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }

    match cli.command {
        Command::Generate { topic, word_count } => {
            let (topic, word_count) = match topic {
                Some(topic) => (
                    Topic::parse(&topic)?,
                    WordCount::new(word_count.unwrap_or_default()),
                ),
                None => {
                    let stdin = std::io::stdin();
                    cli::prompt_topic(&config.topics, &mut stdin.lock(), &mut std::io::stdout())?
                }
            };
            generate(&config, topic, word_count).await
        }
        Command::Serve { bind, port } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let port = port.unwrap_or(config.server.port);
            let workflow = Workflow::from_config(&config, &config.api_key()?)?;
            workflow.store().ensure_dir().await?;

            let state = web::AppState::new(workflow, config.topics.clone());
            web::run_server(&bind, port, state)
                .await
                .map_err(CliError::Server)
        }
        Command::Topics => {
            for (i, topic) in config.topics.iter().enumerate() {
                println!("{}. {}", i + 1, topic);
            }
            Ok(())
        }
        Command::Check => check(&config).await,
    }
}

async fn generate(config: &Config, topic: Topic, word_count: WordCount) -> Result<(), CliError> {
    let workflow = Workflow::from_config(config, &config.api_key()?)?;

    println!("\nGenerating content for: {}", topic);
    println!("Target word count: {}", word_count);
    println!("This may take a few minutes...");

    let result = workflow.run(&topic, word_count).await?;

    println!("\nGeneration complete!");
    println!("Word count: {}", result.word_count);
    println!(
        "Content saved to: {}",
        workflow.store().dir().join(&result.filename).display()
    );
    Ok(())
}

async fn check(config: &Config) -> Result<(), CliError> {
    let mut failures = 0;

    match config.api_key() {
        Ok(key) if key.trim().len() >= MIN_API_KEY_LEN => {
            println!("[ok]   {} found", config.api_key_env);
        }
        Ok(_) => {
            println!("[fail] {} appears invalid (too short)", config.api_key_env);
            failures += 1;
        }
        Err(e) => {
            println!("[fail] {}", e);
            failures += 1;
        }
    }

    let store = ArtifactStore::new(&config.output_dir);
    match check_output_dir(&store).await {
        Ok(()) => println!("[ok]   {} is writable", store.dir().display()),
        Err(e) => {
            println!("[fail] {}", e);
            failures += 1;
        }
    }

    let toolbox = Toolbox::from_config(config)?;
    let outcome = toolbox.search().search("AI security").await;
    match outcome.found() {
        Some(hits) => println!("[ok]   web search returned {} result(s)", hits.len()),
        None => {
            println!("[fail] web search unavailable");
            failures += 1;
        }
    }

    if failures == 0 {
        println!("\nAll checks passed.");
        Ok(())
    } else {
        Err(CliError::Check(failures))
    }
}

async fn check_output_dir(store: &ArtifactStore) -> Result<(), CliError> {
    let path = store.save(".write_check", "").await?;
    tokio::fs::remove_file(&path).await?;
    Ok(())
}
