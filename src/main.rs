//! Standalone CLI for watching the tracker stats stream
//!
//! Run with: cargo run --bin tracker-cli
//! Point it elsewhere with TRACKER_PAGE_URL=http://host:4224/?ruleset=1

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use classic_tracker_link::{Stats, TrackerClient, TrackerConfig};
    use tracing::info;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,classic_tracker_link=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = TrackerConfig::from_env(Stats::default())?;
    info!(url = %config.endpoint, ruleset = config.ruleset.as_u8(), "Starting tracker link");

    let client = TrackerClient::connect(config);
    let handle = client.handle();
    let mut stats = handle.subscribe_stats();
    let mut connected = handle.subscribe_connected();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = connected.changed() => {
                if res.is_err() {
                    break;
                }
                let is_connected = *connected.borrow_and_update();
                info!(connected = is_connected, "Connection state changed");
            }
            res = stats.changed() => {
                if res.is_err() {
                    break;
                }
                let s = stats.borrow_and_update().clone();
                info!(
                    deaths = s.total_deaths(),
                    crates = s.crates_opened,
                    chests = s.chests_opened,
                    damsels_saved = s.damsels_saved,
                    idols = s.idols_grabbed,
                    "stats"
                );
            }
            _ = &mut shutdown => {
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
