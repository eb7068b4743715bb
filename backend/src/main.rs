use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anonchat_backend::{
    config::Config,
    db::create_pool,
    handlers::{polling, DispatchSettings, Dispatcher},
    repositories::Repositories,
    router,
    state::AppState,
    transport::{Messenger, TelegramClient},
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anonchat_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        bot_token = %mask_secret(&config.bot_token),
        admin_id = %config.admin_id,
        http_addr = %config.http_addr,
        webhook = config.webhook_url.is_some(),
        media_lock_seconds = config.media_lock_seconds,
        time_zone = %config.time_zone,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let client = TelegramClient::new(&config.bot_token)?;
    let messenger: Arc<dyn Messenger> = Arc::new(client.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        messenger,
        Repositories::postgres(pool.clone()),
        DispatchSettings::from(&config),
    ));

    match config.webhook_url.as_deref() {
        Some(url) => {
            client
                .set_webhook(url, config.webhook_secret.as_deref())
                .await?;
            tracing::info!(url, "webhook registered");
        }
        None => {
            client.delete_webhook(false).await?;
            tracing::info!("no WEBHOOK_URL, using long polling");
            tokio::spawn(polling::run(client, dispatcher.clone()));
        }
    }

    let addr = config.http_addr;
    let app = router(AppState::new(pool, config, dispatcher));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
