use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DecisionMode;

#[derive(Parser, Debug)]
#[command(
    name = "landscape-agent",
    version,
    about = "Answers system landscape questions with a tool-calling model"
)]
pub struct Cli {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, short, value_enum, default_value_t = RunMode::Interactive)]
    pub mode: RunMode,
    /// Provider id from the config, overriding `default_provider`.
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub system: Option<String>,
    #[arg(long, value_enum)]
    pub decision_mode: Option<DecisionMode>,
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
    /// Print the answer together with the executed tool steps as JSON.
    #[arg(long)]
    pub json: bool,
    #[arg()]
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RunMode {
    /// Answer a single prompt and exit
    Once,
    /// Console loop
    Interactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_mode_collects_prompt_words() {
        let cli = Cli::parse_from([
            "landscape-agent",
            "--mode",
            "once",
            "--decision-mode",
            "structured",
            "status",
            "of",
            "ERX",
        ]);
        assert_eq!(cli.mode, RunMode::Once);
        assert_eq!(cli.decision_mode, Some(DecisionMode::Structured));
        assert_eq!(cli.prompt.join(" "), "status of ERX");
    }

    #[test]
    fn interactive_is_the_default() {
        let cli = Cli::parse_from(["landscape-agent"]);
        assert_eq!(cli.mode, RunMode::Interactive);
        assert!(!cli.json);
    }
}
