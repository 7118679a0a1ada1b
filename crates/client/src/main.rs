use clap::Parser;
use cocar_client::{Session, Subscriber, SubscriberConfig};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Follow one user's CoCar notifications from the terminal.
#[derive(Debug, Parser)]
#[command(name = "cocar-listen", version)]
struct Args {
    /// REST base URL.
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    api_url: String,

    /// WebSocket endpoint.
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
    ws_url: String,

    /// Id of the user the token belongs to.
    #[arg(long)]
    user_id: String,

    /// Access token.
    #[arg(long)]
    token: String,

    /// Delay before refetching after a booking status change, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    refetch_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cocar_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = SubscriberConfig::new(args.api_url, args.ws_url);
    config.refetch_delay = Duration::from_millis(args.refetch_delay_ms);
    let (subscriber, mut toasts) = Subscriber::new(config);

    let state = subscriber
        .authenticate(Session {
            user_id: args.user_id,
            token: args.token,
        })
        .await?;
    info!(
        ?state,
        unread = subscriber.unread_count().await,
        total = subscriber.notifications().await.len(),
        "Listening"
    );

    let mut connection = subscriber.watch_connection();
    loop {
        tokio::select! {
            Some(toast) = toasts.recv() => {
                info!(kind = ?toast.kind, title = %toast.title, "{}", toast.message);
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *connection.borrow_and_update();
                let unread = subscriber.unread_count().await;
                info!(state = ?current, unread, "Connection state");
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    subscriber.logout().await;
    Ok(())
}
