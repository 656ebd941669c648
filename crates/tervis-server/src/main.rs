use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tervis_client::{GeminiClient, HealthNewsClient};
use tervis_core::{
    load_service_config, AnswerComposer, DbConfig, DirectoryFilter, HttpConfig, Identity,
    Language, LocaleResolver, LocationSuggestionService, SearchMode, SearchService,
    ServiceConfig, TextGenerator, UsageThrottle,
};
use tervis_db::{
    CountryRepository, LocationRepository, PreferenceRepository, ProfessionalRepository,
    UsageRepository,
};
use tervis_server::{router, AppState, Command, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::parse();

    // Logs go to stderr to keep stdout clean for CLI output
    init_tracing(config.log_json);

    let service_config = load_service_config(config.config.as_deref())
        .context("Failed to load service configuration")?;

    let db = config
        .db_max_connections
        .map(|max_connections| DbConfig { max_connections })
        .unwrap_or_default();

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let state = build_state(pool, &config, &service_config)?;

    match config.command {
        Command::Serve { bind } => serve(state, bind).await?,
        Command::Search {
            query,
            language,
            user,
            mode,
        } => search(&state, &query, language, user.as_deref(), mode).await?,
        Command::Locations { query } => locations(&state, &query).await,
        Command::News { lang } => news(&state, lang).await,
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tervis=info,tower_http=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_state(
    pool: sqlx::PgPool,
    config: &Config,
    service_config: &ServiceConfig,
) -> anyhow::Result<AppState> {
    let ai = &service_config.ai;
    let model = config.gemini_model.as_deref().unwrap_or(&ai.model);

    let generator: Option<Arc<dyn TextGenerator>> = match config
        .gemini_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
    {
        Some(key) => {
            let client = GeminiClient::new(key, model, ai.timeout())
                .context("Failed to build Gemini client")?;
            info!("Answer narratives use Gemini model {}", model);
            let client: Arc<dyn TextGenerator> = Arc::new(client);
            Some(client)
        }
        None => {
            warn!("GEMINI_API_KEY not set; answer narratives use templates only");
            None
        }
    };

    let news = HealthNewsClient::new(&service_config.news, &HttpConfig::default())
        .context("Invalid news source configuration")?;

    Ok(AppState {
        search: SearchService::new(
            DirectoryFilter::new(
                Arc::new(ProfessionalRepository::new(pool.clone())),
                &service_config.search,
            ),
            AnswerComposer::new(generator, ai.timeout()),
        ),
        suggestions: LocationSuggestionService::new(
            Arc::new(LocationRepository::new(pool.clone())),
            &service_config.search,
        ),
        throttle: UsageThrottle::new(
            Arc::new(UsageRepository::new(pool.clone())),
            &service_config.throttle,
        ),
        locale: LocaleResolver::new(
            Arc::new(PreferenceRepository::new(pool.clone())),
            Arc::new(CountryRepository::new(pool)),
        ),
        news: Arc::new(news),
    })
}

async fn serve(state: AppState, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Runs one search and prints the result
async fn search(
    state: &AppState,
    query: &str,
    language: Language,
    user: Option<&str>,
    mode: SearchMode,
) -> anyhow::Result<()> {
    if let Some(identity) = Identity::resolve(user, None) {
        let decision = state
            .throttle
            .check_and_record(&identity, None, mode, query)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        if !decision.allowed {
            println!(
                "\n⛔ Daily {} search limit reached ({}/{})\n",
                mode, decision.used, decision.limit
            );
            return Ok(());
        }
    }

    let result = state
        .search
        .search(query, language)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("\n🔍 Results for: \"{}\"\n", query);
    println!("{}\n", result.narrative);

    if result.professionals.is_empty() {
        println!("No verified professionals found.");
    } else {
        println!("Found {} verified professionals:\n", result.count);
        for (i, p) in result.professionals.iter().enumerate() {
            println!("{}. {} ({})", i + 1, p.full_name, p.professional_type);
            println!("   📍 {}, {}, {}", p.city, p.state, p.country);
            println!("   📝 {}", p.description);
            println!();
        }
    }

    Ok(())
}

/// Prints location suggestions
async fn locations(state: &AppState, query: &str) {
    if !state.suggestions.accepts(query) {
        eprintln!(
            "Query must be at least {} characters.",
            state.suggestions.min_chars()
        );
        return;
    }

    let suggestions = state.suggestions.suggest(query).await;
    if let Some(err) = &suggestions.error {
        eprintln!("Location lookup failed: {}", err);
    }
    for location in &suggestions.locations {
        println!("{}", location.full_location);
    }
}

/// Prints the health news cards
async fn news(state: &AppState, language: Language) {
    let items = state.news.latest(language).await;
    println!("\n📰 Health news ({})\n", language);
    for (i, item) in items.iter().enumerate() {
        println!("{}. {}", i + 1, item.title);
        println!("   {}", item.description);
        println!("   🔗 {}", item.link);
        println!();
    }
}
