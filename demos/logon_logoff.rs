//! Connects to Omega, logs on one account, sends periodic heartbeats, then
//! logs off. Mirrors the original Python client's own logon/logoff demo.

use std::sync::Arc;
use std::time::Duration;

use omega_gateway::codec::{AccountCredentials, AccountInfo};
use omega_gateway::dispatcher::PrintingResponseHandler;
use omega_gateway::{GatewayConfig, OmegaConnection};

const OMEGA_ENDPOINT: &str = "tcp://0.0.0.0:9999";
const OMEGA_SERVER_KEY: &str = "omega_server_key";

#[tokio::main]
async fn main() -> omega_gateway::Result<()> {
    omega_gateway::logging::init_logging(false);

    // Assigned by the backend; unique per client, may own multiple
    // exchange accounts (denoted by account_id).
    let client_id = 1;
    // Unique per machine; routes responses back to the machine that sent
    // the request.
    let sender_comp_id = uuid::Uuid::new_v4().to_string();

    let mut config = GatewayConfig::new(OMEGA_ENDPOINT, sender_comp_id);
    config.server_public_key = Some(OMEGA_SERVER_KEY.to_string());

    let connection = OmegaConnection::configure_single_client(
        config,
        Arc::new(PrintingResponseHandler),
        client_id,
    );
    connection.start().await?;
    connection
        .wait_until_running(Some(Duration::from_secs(5)))
        .await;

    let account_id = 2;
    let credentials = AccountCredentials::new(
        AccountInfo::new(account_id),
        "api_key",
        "secret_key",
        Some("passphrase".to_string()),
    );

    // Logging on starts the session refresher, which keeps the access
    // token current until logoff.
    connection.logon("client_secret", vec![credentials])?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Heartbeat every minute for two hours, long enough to observe at
    // least one scheduled token refresh.
    for _ in 0..120 {
        connection.send_heartbeat()?;
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    connection.logoff()?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    connection.cleanup().await;
    Ok(())
}
