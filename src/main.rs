use std::sync::Arc;

use vira_express::config::Config;
use vira_express::gateway::GenerationGateway;
use vira_express::middleware::rate_limit::RateLimiter;
use vira_express::store::{PgHistoryStore, PgPlanStore, PgProfileStore};
use vira_express::{app, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = Config::from_env()?;
    log_config(&config);

    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("🗄️ Database ready");

    let shared_state = Arc::new(AppState {
        gateway: GenerationGateway::from_config(&config),
        profiles: Arc::new(PgProfileStore::new(db_pool.clone())),
        history: Arc::new(PgHistoryStore::new(db_pool.clone())),
        plans: Arc::new(PgPlanStore::new(db_pool.clone())),
        jwt_secret: config.jwt_secret.clone(),
        generation_limiter: RateLimiter::new(config.generation_rate_limit_per_minute, 60),
        db_pool: Some(db_pool),
        generation_configured: config.gemini_api_key.is_some(),
    });

    let router = app(shared_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Server running on http://{}", config.bind_addr);
    tracing::info!("📋 API status: http://{}/api/status", config.bind_addr);

    // ConnectInfo feeds the per-IP login limiter
    axum::serve(listener, router.into_make_service_with_connect_info::<std::net::SocketAddr>()).await?;

    Ok(())
}

fn log_config(config: &Config) {
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not found. Generation requests will fail until it is set.");
    }
    tracing::info!(
        "🤖 Models: ideas={} strategy={} image={} (API {})",
        config.models.idea_model,
        config.models.strategy_model,
        config.models.image_model,
        config.models.api_version
    );
    tracing::info!(
        "⏱️ Timeouts: text {}s, image {}s; cache TTL {}h",
        config.models.text_timeout.as_secs(),
        config.models.image_timeout.as_secs(),
        config.cache_ttl_hours
    );
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if cfg!(debug_assertions) {
        "debug,vira_express=trace,sqlx=info,reqwest=info,hyper=info,tower=info"
    } else {
        "info,vira_express=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn"
    };

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    tracing::info!("🎬 ViraExpress starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
