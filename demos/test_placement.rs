use swachhgrid_client::{
    BinDraft, FleetClient, FleetClientOptions, FleetError, PlacementCommand, Position, Role,
};

/// Walk through the armed-click placement flow for both roles
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("🦀 Testing bin placement\n");

    let client = FleetClient::new(FleetClientOptions::from_env()?)?;
    let position = Position::new(12.30, 45.60);

    // Admin: arm, click, create
    println!("✅ Test 1: Admin creates a bin...");
    client.demo_login(Role::Admin).await?;
    let before = client.snapshot().await.bins.len();
    println!("   Mode after arm: {:?}", client.arm().await?);

    match client.click(position).await {
        Some(PlacementCommand::OpenCreateForm(at)) => {
            let draft = BinDraft::at(at)
                .with_name(format!("Demo Bin {}", before + 1))
                .with_description("Placed from the placement demo");
            let bin = client.create_bin(draft).await?;
            println!("✅ Created {} at ({}, {})", bin.id, bin.position.lat, bin.position.lng);
        }
        other => return Err(format!("expected a create form, got {other:?}").into()),
    }
    println!(
        "   Bins: {} → {}\n",
        before,
        client.snapshot().await.bins.len()
    );

    // A second click without re-arming does nothing
    assert!(client.click(position).await.is_none());

    let route = client.optimize_route().await?;
    println!(
        "🗺  Route over {} bins: {:.2} km, {:.0} min\n",
        route.bin_ids.len(),
        route.total_distance,
        route.estimated_time
    );
    client.logout().await?;

    // User: arm, click, request
    println!("✅ Test 2: User requests a bin...");
    client.demo_login(Role::User).await?;
    client.arm().await?;

    match client.click(position).await {
        Some(PlacementCommand::OpenRequestForm(at)) => {
            let request = client.bin_request_at(at).await?;
            let receipt = client.request_bin(request).await?;
            println!(
                "✅ Request {} received (persisted: {})",
                receipt.reference, receipt.persisted
            );
        }
        other => return Err(format!("expected a request form, got {other:?}").into()),
    }

    // Users cannot acknowledge alerts
    let first_alert = client.snapshot().await.alerts.list().first().map(|a| a.id.clone());
    if let Some(id) = first_alert {
        match client.acknowledge_alert(&id).await {
            Err(FleetError::Forbidden { role, action }) => {
                println!("✅ {} may not {}", role, action);
            }
            other => return Err(format!("expected Forbidden, got {other:?}").into()),
        }
    }
    client.logout().await?;

    println!("\n🎉 Placement tests completed!");
    Ok(())
}
