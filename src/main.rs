use clap::Parser;
use hashring_lb::balancer;
use hashring_lb::config::{BalancerArgs, ProvisionerKind};
use hashring_lb::membership::service::MembershipManager;
use hashring_lb::membership::types::Member;
use hashring_lb::provisioner::{
    ExternalProvisioner, HeartbeatProbe, NodeProvisioner, ProcessProvisioner,
};
use hashring_lb::recovery::service::RecoveryLoop;
use hashring_lb::router::service::RequestRouter;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BalancerArgs::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_max_level(if config.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    tracing::info!("Starting load balancer on {}", config.bind);

    // 1. Provisioner:
    let probe = HeartbeatProbe::new(config.health_timeout);
    let (provisioner, initial): (Arc<dyn NodeProvisioner>, Vec<Member>) = match config.provisioner
    {
        ProvisionerKind::External => {
            let external = ExternalProvisioner::new(config.backend_port, probe);
            let initial = config
                .servers
                .iter()
                .map(|name| external.member(name))
                .collect();
            (Arc::new(external), initial)
        }
        ProvisionerKind::Process => {
            tracing::info!("Backend binary: {}", config.backend_bin.display());
            (
                Arc::new(ProcessProvisioner::new(config.backend_bin.clone(), probe)),
                vec![],
            )
        }
    };

    // 2. Membership:
    let membership =
        MembershipManager::new(config.ring, config.readiness, provisioner, initial)?;

    if config.provisioner == ProvisionerKind::Process && !config.servers.is_empty() {
        let outcome = membership
            .add_nodes(config.servers.len() as i64, &config.servers)
            .await?;
        for failure in &outcome.failed {
            tracing::error!(
                "Initial server {:?} did not start: {}",
                failure.name,
                failure.reason
            );
        }
    }

    // 3. Routing:
    let router = RequestRouter::new(membership.clone(), config.router);
    let recovery = RecoveryLoop::new(router, membership.clone());
    let app = balancer::app(membership.clone(), recovery);

    // 4. Spawn stats reporter:
    let stats_membership = membership.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));

        loop {
            interval.tick().await;
            let view = stats_membership.view().await;
            tracing::info!(
                "Cluster stats: {} servers, {} slots occupied",
                view.len(),
                view.ring.occupied()
            );
            for member in &view.members {
                tracing::debug!("  - {} at {}", member.name, member.addr);
            }
        }
    });

    // 5. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    // 6. Release backends:
    for member in membership.members().await {
        if let Err(e) = membership.provisioner().teardown(&member.addr).await {
            tracing::error!("Failed to stop {} at {}: {}", member.name, member.addr, e);
        }
    }
    tracing::info!("Load balancer stopped");

    Ok(())
}
