use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use clap::Parser;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use sha2::{Digest, Sha256};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sentinel_domain::config::{Config, ConfigSeverity, ObservabilityConfig};
use sentinel_governance::ServiceContext;
use sentinel_server::api;
use sentinel_server::cli::{client, Cli, ClientCommand, Command, ConfigCommand};
use sentinel_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let (config, _config_path) = sentinel_server::cli::load_config()?;
            let _tracer_provider = init_tracing(&config.observability);
            std::process::exit(run_server(config).await);
        }
        Some(Command::Serve { host, port, db_path }) => {
            let (mut config, _config_path) = sentinel_server::cli::load_config()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(db_path) = db_path {
                config.server.db_path = db_path;
            }
            let _tracer_provider = init_tracing(&config.observability);
            std::process::exit(run_server(config).await);
        }
        Some(Command::Doctor) => {
            let (config, config_path) = sentinel_server::cli::load_config()?;
            let passed = sentinel_server::cli::doctor::run(&config, &config_path)?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = sentinel_server::cli::load_config()?;
            let valid = sentinel_server::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = sentinel_server::cli::load_config()?;
            sentinel_server::cli::config::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("sentinel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Command::Client(cmd)) => match cmd {
            ClientCommand::Onboard {
                display_name,
                model_hint,
                agent_id,
            } => client::onboard(display_name, model_hint, agent_id).await,
            ClientCommand::ProcessUpdate {
                agent_id,
                api_key,
                response_text,
                complexity,
            } => client::process_update(agent_id, api_key, response_text, complexity).await,
            ClientCommand::Identity { session_key } => client::identity(session_key).await,
        },
    }
}

/// Initialize structured JSON tracing, and — when `observability.otlp_endpoint`
/// is configured — an OTLP span exporter alongside it. Disabled by default;
/// the returned provider must be held for the process lifetime so batched
/// spans keep flushing, and should be `shutdown()` on graceful exit.
fn init_tracing(observability: &ObservabilityConfig) -> Option<SdkTracerProvider> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sentinel_server=debug"));
    let fmt_layer = tracing_subscriber::fmt::layer().json();

    let Some(endpoint) = &observability.otlp_endpoint else {
        tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
        return None;
    };

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
            tracing::error!(error = %e, endpoint, "failed to build OTLP exporter, continuing without it");
            return None;
        }
    };

    let resource = Resource::builder()
        .with_attributes([KeyValue::new("service.name", observability.service_name.clone())])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::TraceIdRatioBased(observability.sample_rate))
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let tracer = opentelemetry::trace::TracerProvider::tracer(&provider, observability.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    tracing::info!(endpoint, "OTLP trace export enabled");
    Some(provider)
}

/// Start the server with the given configuration. Returns the process exit
/// code (spec §6: 0 normal, 1 config error, 2 storage error, 3 bind error).
async fn run_server(config: Config) -> i32 {
    tracing::info!("sentinel starting");

    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();
    if error_count > 0 {
        tracing::error!(error_count, "config validation failed");
        return 1;
    }

    // ── Admin bearer token (read once, hash for constant-time comparison) ──
    let admin_token_hash: Option<Arc<[u8]>> = match std::env::var(&config.admin.token_env) {
        Ok(token) if !token.is_empty() => {
            tracing::info!(env_var = %config.admin.token_env, "admin bearer-token auth enabled");
            Some(Arc::from(Sha256::digest(token.as_bytes()).to_vec().into_boxed_slice()))
        }
        _ => {
            tracing::warn!(
                env_var = %config.admin.token_env,
                "admin bearer-token auth DISABLED — set {} to enable",
                config.admin.token_env
            );
            None
        }
    };

    // ── Governance context (storage, identity, dialectic, kg, collab) ──
    let governance = match ServiceContext::new(config.clone()) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize storage");
            return 2;
        }
    };
    tracing::info!(db_path = %config.server.db_path.display(), "service context ready");

    let state = AppState {
        governance,
        admin_token_hash,
    };

    // ── CORS layer (config-aware) ────────────────────────────────────
    let cors_layer = build_cors_layer(&config.server.cors);

    // ── Concurrency limit (backpressure protection) ─────────────────
    let max_concurrent = std::env::var("SENTINEL_MAX_CONCURRENT_REQUESTS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(256);
    tracing::info!(max_concurrent, "concurrency limit set");

    let app = api::router()
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state);

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            return 3;
        }
    };
    tracing::info!(addr = %addr, "sentinel listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        return 1;
    }
    0
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Origins may contain a trailing `*` wildcard for the port segment (e.g.
/// `http://localhost:*`). These are expanded into a predicate that matches
/// any port on that host. A literal `"*"` allows all origins (not
/// recommended for production).
fn build_cors_layer(cors: &sentinel_domain::config::CorsConfig) -> CorsLayer {
    use axum::http::header;

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::HeaderName::from_static("x-session-key"),
                header::HeaderName::from_static("x-agent-id"),
                header::HeaderName::from_static("x-api-key"),
            ]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            let prefix = origin.trim_end_matches('*').to_owned();
            wildcard_prefixes.push(prefix);
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-session-key"),
            header::HeaderName::from_static("x-agent-id"),
            header::HeaderName::from_static("x-api-key"),
        ])
        .allow_credentials(true)
}
