use anyhow::Context;
use clap::Parser;
use playground_enrich::config::DEFAULT_CACHE_DIR;
use playground_enrich::utils::error::ErrorSeverity;
use playground_enrich::utils::{logger, validation::Validate};
use playground_enrich::{
    CachedEnricher, CancellationSignal, CliConfig, EnrichConfig, EnrichError, Enricher,
    EnrichmentFetcher, FileCache, TomlConfig,
};

fn exit_with(e: &EnrichError) -> ! {
    tracing::error!(
        "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting playground-enrich");

    if let Err(e) = cli.validate() {
        exit_with(&e);
    }

    let file_config = match &cli.config {
        Some(path) => TomlConfig::from_file(path).unwrap_or_else(|e| exit_with(&e)),
        None => TomlConfig::default(),
    };

    // 環境變數為基礎，設定檔覆蓋其上
    let config = EnrichConfig::from_env().unwrap_or_else(|e| exit_with(&e));
    let config = file_config.apply_to(config);
    if let Err(e) = config.validate() {
        exit_with(&e);
    }
    tracing::debug!("Enrich config: {:?}", config);

    let fetcher = EnrichmentFetcher::new(config).unwrap_or_else(|e| exit_with(&e));

    let use_cache = !cli.no_cache && file_config.cache_enabled();
    let enricher: Box<dyn Enricher> = if use_cache {
        let cache_dir = cli
            .cache_dir
            .as_deref()
            .or(file_config.cache_dir())
            .unwrap_or(DEFAULT_CACHE_DIR);
        tracing::info!("💾 Using cache directory: {}", cache_dir);
        Box::new(CachedEnricher::new(fetcher, FileCache::new(cache_dir)))
    } else {
        tracing::info!("💾 Cache disabled");
        Box::new(fetcher)
    };

    let signal = CancellationSignal::new();
    let on_interrupt = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("⏹️ Interrupted, cancelling enrichment");
            on_interrupt.cancel();
        }
    });

    let result = enricher
        .enrich(&cli.address, cli.name.as_deref(), Some(&signal))
        .await;

    match result {
        Ok(Some(record)) => {
            let output = if cli.pretty {
                serde_json::to_string_pretty(&record)
            } else {
                serde_json::to_string(&record)
            }
            .context("failed to serialize enrichment record")?;

            println!("{}", output);
            if record.is_not_found() {
                tracing::info!("🔍 Playground not found with confidence");
            }
        }
        Ok(None) => {
            eprintln!("⏹️ Enrichment cancelled");
            std::process::exit(130);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
