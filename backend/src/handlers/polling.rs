use std::sync::Arc;
use std::time::Duration;

use super::Dispatcher;
use crate::transport::TelegramClient;

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Long-polling loop used when no webhook URL is configured. Runs forever.
pub async fn run(client: TelegramClient, dispatcher: Arc<Dispatcher>) {
    let mut offset = 0;
    loop {
        let updates = match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };
        for update in updates {
            offset = offset.max(update.update_id + 1);
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.handle(update).await });
        }
    }
}
