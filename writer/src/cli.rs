//! Command line surface.

use crate::article::{Topic, WordCount};
use crate::crew::CrewProfile;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Researches and writes AI security articles with a crew of LLM agents
#[derive(Parser, Debug)]
#[command(name = "aisec-writer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file overlaying the built-in defaults
    #[arg(long, global = true, env = "AISEC_WRITER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Crew shape to run (overrides the configuration file)
    #[arg(long, global = true, value_enum)]
    pub profile: Option<CrewProfile>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one article, asking for the topic when none is given
    Generate {
        #[arg(short, long)]
        topic: Option<String>,

        /// Target length in words
        #[arg(short, long)]
        word_count: Option<u32>,
    },

    /// Serve the web form and status pages
    Serve {
        #[arg(long)]
        bind: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// List the configured topics
    Topics,

    /// Verify API key, output directory and web search before a real run
    Check,
}

/// Numbered topic menu. A number picks a configured topic, anything else is
/// taken as a custom topic.
pub fn prompt_topic<R: BufRead, W: Write>(
    topics: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<(Topic, WordCount), CliError> {
    writeln!(output, "\nAvailable topics:")?;
    for (i, topic) in topics.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, topic)?;
    }

    write!(output, "\nSelect topic number or enter custom topic: ")?;
    output.flush()?;
    let choice = read_line(input)?;

    let topic = match choice.parse::<usize>() {
        Ok(n) => match n.checked_sub(1).and_then(|i| topics.get(i)) {
            Some(topic) => Topic::parse(topic)?,
            None => return Err(CliError::InvalidChoice(n)),
        },
        Err(_) => Topic::parse(&choice)?,
    };

    write!(output, "Word count (default {}): ", WordCount::default())?;
    output.flush()?;
    let word_count = WordCount::parse(Some(&read_line(input)?));

    Ok((topic, word_count))
}

fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
