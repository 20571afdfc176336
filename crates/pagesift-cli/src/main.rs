use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use pagesift_client::{
    BrowserFetcher, HttpFetcher, MarkdownNormalizer, OpenAiExtractor, TextNormalizer,
};
use pagesift_core::schema::FieldSchema;
use pagesift_core::traits::{Extractor, Fetcher, Normalizer};
use pagesift_core::{ExtractionResult, Pipeline};

#[derive(Parser)]
#[command(
    name = "pagesift",
    version,
    about = "Render a web page and extract structured fields with an LLM"
)]
struct Cli {
    /// Target URL to render and extract from
    #[arg(short, long)]
    url: String,

    /// Path to a JSON file mapping field names to types,
    /// e.g. {"market_cap": "string", "revenue": "string"}
    #[arg(short, long)]
    schema: PathBuf,

    /// LLM model to use
    #[arg(short, long, env = "PAGESIFT_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(
        short,
        long,
        env = "PAGESIFT_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    base_url: String,

    /// API key (reads from PAGESIFT_API_KEY env var if not provided)
    #[arg(short, long, env = "PAGESIFT_API_KEY")]
    api_key: String,

    /// Fetch with a plain HTTP GET instead of rendering in a browser
    #[arg(long, default_value_t = false)]
    http: bool,

    /// Run the browser with a visible window
    #[arg(long, default_value_t = false)]
    headful: bool,

    /// Navigation timeout in seconds; on expiry the browser path proceeds
    /// with whatever content has loaded
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// How to reduce the fetched HTML before it reaches the LLM
    #[arg(long, value_enum, default_value_t = CleanMode::Text)]
    clean: CleanMode,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CleanMode {
    /// Flat visible text, whitespace tokens joined by newlines
    Text,
    /// Markdown conversion that keeps headings, lists, and links
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("pagesift_core=info,pagesift_client=info,pagesift_cli=info")
        }))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let schema = FieldSchema::from_file(&cli.schema)
        .with_context(|| format!("Failed to load schema from {}", cli.schema.display()))?;

    let extractor = OpenAiExtractor::with_base_url(&cli.api_key, &cli.model, &cli.base_url)
        .map_err(|e| anyhow::anyhow!(e))?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    let result = match (cli.http, cli.clean) {
        (true, CleanMode::Text) => {
            let fetcher = HttpFetcher::with_timeout(timeout).map_err(|e| anyhow::anyhow!(e))?;
            run(fetcher, TextNormalizer::new(), extractor, &cli, &schema).await?
        }
        (true, CleanMode::Markdown) => {
            let fetcher = HttpFetcher::with_timeout(timeout).map_err(|e| anyhow::anyhow!(e))?;
            run(fetcher, MarkdownNormalizer::new(), extractor, &cli, &schema).await?
        }
        (false, CleanMode::Text) => {
            run(
                browser_fetcher(&cli, timeout),
                TextNormalizer::new(),
                extractor,
                &cli,
                &schema,
            )
            .await?
        }
        (false, CleanMode::Markdown) => {
            run(
                browser_fetcher(&cli, timeout),
                MarkdownNormalizer::new(),
                extractor,
                &cli,
                &schema,
            )
            .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result.data)?);

    Ok(())
}

fn browser_fetcher(cli: &Cli, timeout: Duration) -> BrowserFetcher {
    let fetcher = BrowserFetcher::new().with_timeout(timeout);
    if cli.headful {
        fetcher.with_head()
    } else {
        fetcher
    }
}

async fn run<F, N, E>(
    fetcher: F,
    normalizer: N,
    extractor: E,
    cli: &Cli,
    schema: &FieldSchema,
) -> Result<ExtractionResult>
where
    F: Fetcher,
    N: Normalizer,
    E: Extractor,
{
    let pipeline = Pipeline::new(fetcher, normalizer, extractor, cli.model.clone());
    pipeline
        .run(&cli.url, schema)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
