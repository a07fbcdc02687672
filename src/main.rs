//! Command-line front end for the lab report engine.
//!
//! Usage:
//!   labwise parse extracted.txt
//!   labwise recommend --provider gemini predictions.json
//!   labwise analyze --ranges reference_ranges.csv --text report.txt --human

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use labwise::config::{self, LlmConfig, LlmProvider, DEFAULT_MAX_PROMPT_TESTS, DEFAULT_TIMEOUT_SECS};
use labwise::pipeline::extract_test_items;
use labwise::reference::{ReferenceTable, ResolverOptions};
use labwise::{Analyzer, Recommender, TestItem};

/// Lab report interpretation: extraction, classification and recommendations.
#[derive(Parser)]
#[command(name = "labwise", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract (test, value, range) items from raw report text.
    Parse {
        /// Input file, or `-` for stdin. Plain text, or JSON carrying the text.
        input: PathBuf,
    },
    /// Recommend next steps for a test payload.
    Recommend {
        /// JSON payload file, or `-` for stdin.
        input: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Classify tests against a reference table and build a report.
    Analyze {
        /// Reference range CSV.
        #[arg(long, env = "LABWISE_RANGES")]
        ranges: PathBuf,

        /// Input file, or `-` for stdin.
        input: PathBuf,

        /// Treat the input as raw report text instead of JSON.
        #[arg(long)]
        text: bool,

        /// Also print a human-readable summary to stderr.
        #[arg(long)]
        human: bool,

        /// Minimum reference-name length for substring matching (0 = off).
        #[arg(long, default_value_t = 0)]
        min_contains_len: usize,
    },
}

#[derive(Args)]
struct LlmArgs {
    /// External model provider: ollama, gemini or none.
    #[arg(long, env = "LABWISE_PROVIDER", default_value = "none")]
    provider: LlmProvider,

    /// Model name. Defaults per provider.
    #[arg(long)]
    model: Option<String>,

    /// Service endpoint. Defaults per provider.
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Maximum tests listed in one prompt.
    #[arg(long, default_value_t = DEFAULT_MAX_PROMPT_TESTS)]
    max_prompt_tests: usize,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl From<LlmArgs> for LlmConfig {
    fn from(args: LlmArgs) -> Self {
        Self {
            provider: args.provider,
            base_url: args.base_url,
            model: args.model,
            api_key: args.api_key,
            timeout_secs: args.timeout_secs,
            max_prompt_tests: args.max_prompt_tests,
        }
    }
}

/// Keys written by `parse`.
#[derive(Serialize)]
struct ParsedItem<'a> {
    test: &'a str,
    value: Option<f64>,
    ref_lower: Option<f64>,
    ref_upper: Option<f64>,
}

impl<'a> From<&'a TestItem> for ParsedItem<'a> {
    fn from(item: &'a TestItem) -> Self {
        Self {
            test: &item.name,
            value: item.value,
            ref_lower: item.ref_lower,
            ref_upper: item.ref_upper,
        }
    }
}

const TEXT_FIELDS: &[&str] = &["extracted_text", "extractedText", "extracted"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match Cli::parse().command {
        Command::Parse { input } => run_parse(&input),
        Command::Recommend { input, llm } => run_recommend(&input, llm.into()),
        Command::Analyze {
            ranges,
            input,
            text,
            human,
            min_contains_len,
        } => run_analyze(&ranges, &input, text, human, ResolverOptions { min_contains_len }),
    }
}

fn run_parse(input: &Path) -> Result<()> {
    let raw = read_input(input)?;
    let text = report_text(&raw);
    let items = extract_test_items(&text);
    let parsed: Vec<ParsedItem> = items.iter().map(ParsedItem::from).collect();
    print_json(&serde_json::json!({ "items": parsed }))
}

fn run_recommend(input: &Path, config: LlmConfig) -> Result<()> {
    let payload: Value = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("Input {} is not valid JSON", input.display()))?;

    let recommender = match Recommender::from_config(config) {
        Ok(recommender) => recommender,
        Err(e) => {
            tracing::warn!(error = %e, "External model unavailable, using rule-based fallback");
            Recommender::fallback_only()
        }
    };

    print_json(&recommender.recommend_payload(&payload))
}

fn run_analyze(
    ranges: &Path,
    input: &Path,
    text: bool,
    human: bool,
    options: ResolverOptions,
) -> Result<()> {
    let table = ReferenceTable::load(ranges)
        .with_context(|| format!("Cannot load reference table {}", ranges.display()))?;
    let analyzer = Analyzer::with_options(&table, options);
    let raw = read_input(input)?;

    let report = if text {
        analyzer.analyze_text(&raw)
    } else {
        match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => analyzer.analyze_payload(&payload),
            Err(_) => analyzer
                .analyze_model_output(&raw)
                .context("Input is neither JSON nor a reply containing a JSON object")?,
        }
    };

    print_json(&report)?;
    if human {
        eprintln!("{}", report.human_summary());
    }
    Ok(())
}

/// File contents, or all of stdin for `-`.
fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

/// Unwrap text carried inside a JSON envelope; anything else is the text itself.
fn report_text(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(obj)) => TEXT_FIELDS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        _ => raw.to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn report_text_unwraps_envelopes() {
        assert_eq!(report_text(r#"{"extractedText": "Hb 11 13-17"}"#), "Hb 11 13-17");
        assert_eq!(report_text(r#""Glucose 95 70-110""#), "Glucose 95 70-110");
        assert_eq!(report_text("Glucose 95 70-110"), "Glucose 95 70-110");
        assert_eq!(report_text(r#"{"other": 1}"#), "");
    }

    #[test]
    fn parsed_item_uses_test_key() {
        let item = TestItem::new("Hemoglobin", Some(11.0)).with_range(13.0, 17.0);
        let json = serde_json::to_value(ParsedItem::from(&item)).unwrap();
        assert_eq!(json["test"], "Hemoglobin");
        assert_eq!(json["ref_lower"], 13.0);
        assert!(json.get("unit").is_none());
    }

    #[test]
    fn recommend_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "labwise",
            "recommend",
            "--provider",
            "ollama",
            "--model",
            "medgemma:27b",
            "-",
        ])
        .unwrap();
        let Command::Recommend { llm, .. } = cli.command else {
            panic!("expected recommend");
        };
        let config = LlmConfig::from(llm);
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.model(), "medgemma:27b");
    }
}
