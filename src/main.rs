use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prom_query::config::DEFAULT_HOST;
use prom_query::query::istio::DEFAULT_METRIC_PREFIX;
use prom_query::{
    create_query, ClientConfig, IstioProfile, IstioQuery, IstioQueryConfig, MetricQuery,
    MetricRestClient, QueryKind,
};

const APP_NAME: &str = "prom-query";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_QUERY: &str = "rate(istio_request_count[3m])";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Profile {
    /// Pod and service QPS/latency, keyed by destination_uid
    PodAndService,
    /// Service QPS/latency only, keyed by destination_service
    ServiceOnly,
}

impl From<Profile> for IstioProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::PodAndService => IstioProfile::PodAndService,
            Profile::ServiceOnly => IstioProfile::ServiceOnly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = APP_NAME,
    version = VERSION,
    about = "Query Prometheus for Istio pod and service metrics",
    long_about = "Lists the scraped jobs, runs every Istio query type of the selected profile and a generic PromQL query, and logs the resulting records"
)]
struct Args {
    /// The address of the Prometheus server
    #[arg(long, env = "PROMETHEUS_URL", default_value = DEFAULT_HOST)]
    prom_url: String,

    /// Generic PromQL query to run after the Istio queries
    #[arg(long, env = "PROMETHEUS_QUERY", default_value = DEFAULT_QUERY)]
    query: String,

    /// Basic-auth username
    #[arg(long, env = "PROMETHEUS_USER", default_value = "")]
    username: String,

    /// Basic-auth password
    #[arg(long, env = "PROMETHEUS_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Accept any certificate from an https server
    #[arg(long, env = "PROMETHEUS_INSECURE_SKIP_TLS_VERIFY")]
    insecure_skip_tls_verify: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Istio query profile
    #[arg(long, value_enum, default_value_t = Profile::PodAndService)]
    profile: Profile,

    /// Prefix of the Istio metric names (empty for Istio 2.x)
    #[arg(long, default_value = DEFAULT_METRIC_PREFIX)]
    metric_prefix: String,

    /// Log level
    #[arg(
        long,
        env = "RUST_LOG",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level (trace/debug/info/warn/error)"
    )]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    info!(
        app = APP_NAME,
        version = VERSION,
        prom_url = %args.prom_url,
        profile = ?args.profile,
        "announcement"
    );

    let config = ClientConfig::new(args.prom_url.clone())
        .with_basic_auth(args.username.clone(), args.password.clone())
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_insecure_skip_tls_verify(args.insecure_skip_tls_verify);

    let client = match MetricRestClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create Prometheus client: {}", e);
            std::process::exit(1);
        }
    };

    print_jobs(&client).await;

    if let Err(e) = print_istio_metrics(&client, &args).await {
        error!(error = %e, "Istio metrics failed");
    }

    if let Err(e) = print_generic_metrics(&client, &args.query).await {
        error!(query = %args.query, error = %e, "Failed to get metrics for query");
    }
}

async fn print_jobs(client: &MetricRestClient) {
    match client.jobs().await {
        Ok(jobs) => info!(jobs = %jobs, "Scraped jobs"),
        Err(e) => error!(error = %e, "Failed to get jobs"),
    }
}

/// Run every query type of the selected Istio profile
async fn print_istio_metrics(client: &MetricRestClient, args: &Args) -> Result<()> {
    let mut query = IstioQuery::new(IstioQueryConfig {
        profile: args.profile.into(),
        metric_prefix: args.metric_prefix.clone(),
    });

    for qtype in 0..query.query_type_count() {
        query.set_query_type(qtype)?;
        let description = query.family().description();

        let records = match client.get_metrics(&query).await {
            Ok(records) => records,
            Err(e) => {
                error!(query = %query.query(), error = %e, "Failed to get metric");
                continue;
            }
        };

        info!(count = records.len(), "====== {} =========", description);
        for (i, record) in records.iter().enumerate() {
            info!("\t[{}] {}", i, record);
        }
    }

    Ok(())
}

async fn print_generic_metrics(client: &MetricRestClient, query: &str) -> Result<()> {
    let input = create_query(QueryKind::Generic(query.to_string()));
    let records = client.get_metrics(&*input).await?;

    info!(query = %query, count = records.len(), "Generic query completed");
    for (i, record) in records.iter().enumerate() {
        info!("[{}] {}", i, record);
    }
    Ok(())
}

/// Initialize the logging system
fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = match log_level {
        "trace" => EnvFilter::new("trace"),
        "debug" => EnvFilter::new("debug"),
        "info" => EnvFilter::new("info"),
        "warn" => EnvFilter::new("warn"),
        "error" => EnvFilter::new("error"),
        _ => EnvFilter::new("info"),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true),
        )
        .with(env_filter)
        .try_init()?;

    Ok(())
}
