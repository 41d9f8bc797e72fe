use clap::{Parser, Subcommand};
use gatewarden::{gen_rsa_key, serve, AppCtx, EnvConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(version, about, arg_required_else_help(true))]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the authorization server.
    Serve,

    /// Load and validate `Configurations/{Tenants,Clients}/*.yaml`, then exit.
    Configure,

    /// Generate a new RSA signing key into the key store.
    GenRsaKey {
        #[arg(long)]
        kid: String,
        #[arg(long)]
        set_active: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EnvConfig::load();
    init_tracing(&config);

    info!("gatewarden v{VERSION}");

    match Cli::parse().command {
        Some(Command::Serve) => {
            let ctx = AppCtx::new(config).await?;
            serve(ctx).await?;
        }
        Some(Command::Configure) => {
            configure(config).await?;
        }
        Some(Command::GenRsaKey { kid, set_active }) => {
            let ctx = AppCtx::new(config).await?;
            gen_rsa_key(&ctx.key_store, &kid, set_active)?;
        }
        None => {}
    }

    Ok(())
}

fn init_tracing(config: &EnvConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        gatewarden::config::LogFormat::Json => subscriber.json().init(),
        gatewarden::config::LogFormat::Pretty => subscriber.init(),
    }
}

/// `gatewarden configure`: loads every tenant/client file once so an
/// operator can catch a malformed entry before `serve` starts (`serve`
/// itself logs and skips per spec §4.A, favoring uptime over strictness).
async fn configure(config: EnvConfig) -> anyhow::Result<()> {
    use gatewarden::entity::{EntityStore, FileSource};

    let store = EntityStore::new();
    let source = FileSource::new(config.tenants_dir(), config.clients_dir());
    source.load_once(&store);

    info!("configuration loaded");
    Ok(())
}
