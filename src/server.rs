//! Reusable server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, provider
//! clients, services, the HTTP listener and graceful shutdown. Both the
//! `ares-backend` binary and `ares-cli serve` start the server through it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};

use crate::application::{AppServices, Registration};
use crate::config::{AppConfig, ProviderBackend, SeedAdminConfig};
use crate::domain::DomainError;
use crate::infrastructure::build_providers;
use crate::interfaces::http::{create_api_router, RouterContext};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the server.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Create `config.seed_admin` on the memory backend (default: true).
    pub seed_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            seed_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// # Examples
///
/// ```rust,no_run
/// use ares_backend::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// `None` when the providers could not be configured.
    pub services: Option<AppServices>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the listener is bound to.
    pub local_addr: SocketAddr,

    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the server with the given options.
    ///
    /// A provider configuration error does not abort startup: the server
    /// still answers health probes and reports 503 on `/api/*`.
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;

        info!(version = env!("CARGO_PKG_VERSION"), "Starting Ares backend...");

        let prometheus_handle = prometheus_handle();

        // ── Providers & services ───────────────────────────────
        let (services, provider) = match build_providers(&config) {
            Ok(providers) => {
                let services = AppServices::new(&providers, config.admin_auth.mode);
                (Some(services), providers.backend.to_string())
            }
            Err(e) => {
                error!(error = %e, "Provider configuration failed; /api will answer 503");
                (None, "unavailable".to_string())
            }
        };

        if let (Some(services), Some(seed)) = (&services, &config.seed_admin) {
            if opts.seed_admin && config.provider.backend == ProviderBackend::Memory {
                seed_admin(services, seed).await;
            }
        }

        // ── HTTP API ───────────────────────────────────────────
        let router = create_api_router(RouterContext {
            services: services.clone(),
            provider,
            base_url: config.server.public_url(),
            cors_origin: config.server.cors_origin.clone(),
            metrics: prometheus_handle,
            started_at: Arc::new(Instant::now()),
        });

        let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP API listening on http://{}", local_addr);
        info!("Swagger UI available at {}/docs/", config.server.public_url());

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("HTTP API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("HTTP API server error: {}", e);
            }
        });

        Ok(Self {
            services,
            config,
            local_addr,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for shutdown to be triggered, then for in-flight requests to
    /// drain, bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            shutdown, api_task, ..
        } = self;

        shutdown.signal().wait().await;

        let abort = api_task.abort_handle();
        let drained = shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("HTTP API server stopped"),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!("HTTP API server task panicked: {}", e),
                }
            })
            .await;
        if !drained {
            abort.abort();
        }

        info!("Ares backend shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global metrics recorder can only be installed once per process, so a
/// restarted server reuses the first handle.
fn prometheus_handle() -> PrometheusHandle {
    use std::sync::OnceLock;
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                handle
            }
            Err(e) => {
                warn!(error = %e, "Could not install the metrics recorder; /metrics will be empty");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Registers the seed admin (if missing) and grants it the admin claim.
async fn seed_admin(services: &AppServices, seed: &SeedAdminConfig) {
    let registration = Registration {
        email: seed.email.clone(),
        password: seed.password.clone(),
        username: seed.username.clone(),
    };

    match services.accounts.register(registration).await {
        Ok(registered) => info!(uid = %registered.account.uid, "Seed admin registered"),
        Err(DomainError::EmailTaken) | Err(DomainError::UsernameTaken(_)) => {}
        Err(e) => {
            error!(error = %e, "Failed to register seed admin");
            return;
        }
    }

    match services.admin.set_admin_claim(&seed.email, true).await {
        Ok(_) => {
            info!(email = %seed.email, "Seed admin ready");
            warn!("Seed admin uses a configured password; change it outside local development");
        }
        Err(e) => error!(error = %e, "Failed to grant the seed admin claim"),
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
