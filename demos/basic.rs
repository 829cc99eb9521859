use swachhgrid_client::{FleetClient, FleetClientOptions, Role};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Create client
    let options = FleetClientOptions::from_env()?;
    println!("Connecting to SwachhGrid at {}...", options.base_url);
    let client = FleetClient::new(options)?;

    // Reuse the persisted session, or sign in as the demo admin
    let session = match client.restore().await? {
        Some(session) => session,
        None => client.demo_login(Role::Admin).await?,
    };
    println!("Signed in as {} ({})", session.display_name(), session.role());

    let snapshot = client.snapshot().await;
    println!(
        "{} bins, {} unacknowledged alerts",
        snapshot.bins.len(),
        snapshot.alerts.unacknowledged_count()
    );

    // Print every revision until Ctrl+C
    let mut revisions = client.subscribe();
    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = client.snapshot().await;
                println!(
                    "revision {}: {} bins, {} unacknowledged alerts, connection {:?}",
                    snapshot.revision,
                    snapshot.bins.len(),
                    snapshot.alerts.unacknowledged_count(),
                    client.connection_state()
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // Disconnect
    println!("Logging out...");
    client.logout().await?;
    println!("Logged out!");

    Ok(())
}
