use std::sync::Arc;
use std::time::Duration;

use market_brief::collect::channels::ChannelFeed;
use market_brief::collect::{ChannelFeedCollector, Collector, SearchCollector};
use market_brief::config::{BriefConfig, IdleNotice};
use market_brief::deliver::TelegramSink;
use market_brief::generate::{CredentialPool, DispatchConfig, GeminiBackend, GenerationClient};
use market_brief::pipeline::{Pipeline, PipelineDeps};
use market_brief::store::{FileSeenStore, StoreWritePolicy};

const DEFAULT_KEYWORDS: &[&str] = &[
    "US stock market news today",
    "PSTG stock news",
    "SPHD ETF news",
    "high dividend ETF analysis",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Required credentials from environment
    let telegram_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
        eprintln!("Error: TELEGRAM_BOT_TOKEN not set");
        std::process::exit(1);
    });
    let chat_id = std::env::var("TELEGRAM_CHAT_ID").unwrap_or_else(|_| {
        eprintln!("Error: TELEGRAM_CHAT_ID not set");
        std::process::exit(1);
    });

    // One or more backend keys, comma-separated, tried in order.
    let credentials: Vec<secrecy::SecretString> = std::env::var("GEMINI_API_KEYS")
        .or_else(|_| std::env::var("GEMINI_API_KEY"))
        .unwrap_or_else(|_| {
            eprintln!("Error: GEMINI_API_KEYS (or GEMINI_API_KEY) not set");
            std::process::exit(1);
        })
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(secrecy::SecretString::from)
        .collect();

    let search_endpoint = std::env::var("MARKET_BRIEF_SEARCH_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8888/search".to_string());

    let keywords: Vec<String> = std::env::var("MARKET_BRIEF_KEYWORDS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect());

    // Optional channel feeds: "tag=url,tag=url"
    let channel_feeds: Vec<ChannelFeed> = std::env::var("MARKET_BRIEF_CHANNEL_FEEDS")
        .map(|raw| {
            raw.split(',')
                .filter_map(|entry| {
                    entry.trim().split_once('=').map(|(tag, url)| ChannelFeed {
                        tag: tag.to_string(),
                        url: url.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let store_path = std::env::var("MARKET_BRIEF_STORE_PATH")
        .unwrap_or_else(|_| "./data/seen-items.txt".to_string());
    if let Some(parent) = std::path::Path::new(&store_path).parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let idle_notice = match std::env::var("MARKET_BRIEF_IDLE").as_deref() {
        Ok("silent") => IdleNotice::Silent,
        _ => IdleNotice::Notify,
    };

    eprintln!("📊 Market Brief v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Run: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"));
    eprintln!("   Keywords: {}", keywords.len());
    eprintln!("   Channel feeds: {}", channel_feeds.len());
    eprintln!("   Credentials: {}", credentials.len());
    eprintln!("   Seen store: {}\n", store_path);

    let mut collectors: Vec<Arc<dyn Collector>> =
        vec![Arc::new(SearchCollector::new(search_endpoint, keywords))];
    if !channel_feeds.is_empty() {
        collectors.push(Arc::new(ChannelFeedCollector::new(channel_feeds)));
    }

    let generator = GenerationClient::new(
        Arc::new(GeminiBackend::new()),
        CredentialPool::new(credentials),
        DispatchConfig {
            attempts_per_credential: 3,
            retry_delay: Duration::from_secs(5),
            default_model: "gemini-1.5-flash".to_string(),
        },
    );

    let deps = PipelineDeps {
        collectors,
        store: Arc::new(FileSeenStore::new(&store_path)),
        generator,
        sink: Arc::new(TelegramSink::new(
            secrecy::SecretString::from(telegram_token),
            chat_id,
        )),
    };

    let config = BriefConfig {
        idle_notice,
        store_write_policy: StoreWritePolicy::Warn,
        ..BriefConfig::default()
    };

    let pipeline = Pipeline::new(config, deps);
    match pipeline.run_once().await {
        Ok(report) => {
            tracing::info!(
                collected = report.collected,
                novel = report.novel,
                generated = report.generated,
                delivered = report.delivered,
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            // The run is over either way; there is no further channel to
            // report to beyond the sink itself.
            tracing::error!(error = %e, "Run ended with failure");
            Err(e.into())
        }
    }
}
