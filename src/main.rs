use std::sync::Arc;

use bornet::auth::{AccessToken, GoTrueClient};
use bornet::backend::PostgrestClient;
use bornet::config::AppConfig;
use bornet::notify::{ChannelNotifier, NotificationVariant, Notifier};
use bornet::profile::ProfileManager;
use bornet::reconcile::{PendingDataHandler, ReconcileOutcome, Reconciler};
use bornet::staging::LibSqlStagingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export BORNET_SUPABASE_URL=https://<project>.supabase.co");
        eprintln!("  export BORNET_SUPABASE_ANON_KEY=...");
        std::process::exit(1);
    });

    eprintln!("BorNet v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.backend.url);
    eprintln!("   Staging: {}", config.sync.staging_db_path.display());
    eprintln!(
        "   Pending check in {} ms\n",
        config.sync.pending_delay.as_millis()
    );

    run(config).await?;
    Ok(())
}

async fn run(config: AppConfig) -> bornet::error::Result<()> {
    // ── Staging store ────────────────────────────────────────────────────
    let store = Arc::new(LibSqlStagingStore::new_local(&config.sync.staging_db_path).await?);

    // ── Backend clients ──────────────────────────────────────────────────
    let token = AccessToken::from_config(&config.backend);
    let session = Arc::new(GoTrueClient::new(&config.backend, token.clone()));
    let backend = Arc::new(PostgrestClient::new(&config.backend, token));

    // ── Notifications ────────────────────────────────────────────────────
    let (notifier, mut notes) = ChannelNotifier::channel(16);
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let printer = tokio::spawn(async move {
        while let Some(note) = notes.recv().await {
            let marker = match note.variant {
                NotificationVariant::Default => "✓",
                NotificationVariant::Destructive => "✗",
            };
            eprintln!("{marker} {}: {}", note.title, note.description);
        }
    });

    // ── Pending profile data ─────────────────────────────────────────────
    let reconciler = Arc::new(Reconciler::new(
        store,
        session.clone(),
        backend.clone(),
        notifier.clone(),
    ));
    let handler = PendingDataHandler::new(reconciler).with_delay(config.sync.pending_delay);

    let outcome = handler.mount().finished().await;
    let applied = match outcome {
        Some(ReconcileOutcome::Applied(report)) => {
            tracing::info!(user_id = %report.user_id, cleared = report.cleared, "Pending profile data applied");
            true
        }
        Some(other) => {
            tracing::info!(outcome = ?other, "Nothing applied");
            false
        }
        None => {
            tracing::info!("Pending data check did not run");
            false
        }
    };

    // ── Profile ──────────────────────────────────────────────────────────
    let manager = ProfileManager::new(session, backend.clone(), backend, notifier);
    let loaded = if applied {
        Some(manager.load().await)
    } else {
        None
    };

    // The printer ends once every notifier handle is dropped.
    drop(handler);
    drop(manager);
    let _ = printer.await;

    if let Some(view) = loaded.transpose()? {
        let name = view
            .profile
            .as_ref()
            .map(|p| p.legal_name.as_str())
            .unwrap_or("(no profile row)");
        eprintln!(
            "Profile: {name}, {} education, {} work experience",
            view.education.len(),
            view.work_experience.len()
        );
    }

    Ok(())
}
