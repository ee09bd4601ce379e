//! End-to-end request/response round trips against a fake ROUTER peer,
//! adapted from the original client's inproc ROUTER/DEALER test fixtures
//! (now over `ipc://`, the scheme the vendored transport actually
//! implements).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use omega_gateway::codec::{
    self, AccountInfo, ExecutionReport, MessageBody, Order, OrderStatus, OrderType, RequestHeader,
    Side,
};
use omega_gateway::dispatcher::ResponseHandler;
use omega_gateway::{GatewayConfig, OmegaConnection};
use zeromq::{RouterSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

fn ipc_endpoint(name: &str) -> String {
    format!(
        "ipc:///tmp/omega-gateway-test-{name}-{}",
        std::process::id()
    )
}

#[derive(Default)]
struct RecordingHandler {
    execution_reports: AtomicUsize,
    logon_acks: AtomicUsize,
}

impl ResponseHandler for RecordingHandler {
    fn on_execution_report(&self, _header: &RequestHeader, _report: &ExecutionReport) {
        self.execution_reports.fetch_add(1, Ordering::SeqCst);
    }
    fn on_logon_ack(&self, _header: &RequestHeader, _ack: &codec::LogonAck) {
        self.logon_acks.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn place_order_reaches_the_router_peer() {
    let endpoint = ipc_endpoint("place-order");

    let mut router = RouterSocket::new();
    router.bind(&endpoint).await.expect("router bind");

    let config = GatewayConfig::new(&endpoint, "client-a");
    let handler = Arc::new(RecordingHandler::default());
    let connection = OmegaConnection::configure_single_client(config, handler, 1);
    connection.start().await.expect("transport start");
    assert!(
        connection
            .wait_until_running(Some(Duration::from_secs(2)))
            .await
    );

    let order = Order::new(
        AccountInfo::new(2),
        "client-order-1",
        "link-1",
        "BTC/USD",
        "buy",
        "limit",
        1.5,
        6000.0,
        0.0,
        "gtc",
        0.0,
        "none",
        0.0,
    );
    connection.place_order(order).expect("enqueue place_order");

    let (_identity, envelope) = recv_envelope(&mut router).await;
    match envelope.body {
        MessageBody::PlaceOrder { order } => {
            assert_eq!(order.symbol, "BTC/USD");
            assert_eq!(order.side, Side::Buy);
            assert_eq!(order.price, 6000.0);
        }
        other => panic!("expected PlaceOrder, got {other:?}"),
    }

    connection.stop();
    connection.cleanup().await;
}

#[tokio::test]
async fn execution_report_from_router_reaches_the_handler() {
    let endpoint = ipc_endpoint("exec-report");

    let mut router = RouterSocket::new();
    router.bind(&endpoint).await.expect("router bind");

    let config = GatewayConfig::new(&endpoint, "client-b");
    let handler = Arc::new(RecordingHandler::default());
    let handler_dyn: Arc<dyn ResponseHandler> = handler.clone();
    let connection = OmegaConnection::configure_single_client(config, handler_dyn, 1);
    connection.start().await.expect("transport start");
    assert!(
        connection
            .wait_until_running(Some(Duration::from_secs(2)))
            .await
    );

    // Prime the router's peer table by receiving the client's first
    // outbound frame (a heartbeat) before replying.
    connection.send_heartbeat().expect("enqueue heartbeat");
    let (identity, _envelope) = recv_envelope(&mut router).await;

    let report = ExecutionReport {
        account_info: AccountInfo::new(2),
        order_id: "o-1".into(),
        client_order_id: "c-1".into(),
        symbol: "BTC/USD".into(),
        side: Side::Buy,
        order_type: OrderType::Limit,
        order_status: OrderStatus::New,
        price: 6000.0,
        quantity: 1.5,
        filled_quantity: 0.0,
        avg_fill_price: 0.0,
        limit_price: 6000.0,
        stop_price: 0.0,
        rejection_reason: None,
    };
    let envelope = codec::Envelope {
        header: RequestHeader::new(1, "client-b"),
        body: MessageBody::ExecutionReport(report),
    };
    let bytes = codec::encode(&envelope).unwrap();
    let mut msg = ZmqMessage::from(identity);
    msg.push_back(bytes.into());
    router.send(msg).await.expect("router send");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while handler.execution_reports.load(Ordering::SeqCst) == 0 {
        if tokio::time::Instant::now() > deadline {
            panic!("handler never observed the execution report");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    connection.stop();
    connection.cleanup().await;
}

#[tokio::test]
async fn scheduled_refresh_carries_the_logon_identity() {
    let endpoint = ipc_endpoint("scheduled-refresh");

    let mut router = RouterSocket::new();
    router.bind(&endpoint).await.expect("router bind");

    let mut config = GatewayConfig::new(&endpoint, "client-refresh");
    config.refresh_safety_fraction = 0.1;
    let handler = Arc::new(RecordingHandler::default());
    let connection = OmegaConnection::new(config, handler);
    connection.start().await.expect("transport start");
    assert!(
        connection
            .wait_until_running(Some(Duration::from_secs(2)))
            .await
    );

    let header = RequestHeader::new(99, "client-refresh");
    connection
        .logon(header, "client_secret", vec![])
        .expect("enqueue logon");
    let (identity, envelope) = recv_envelope(&mut router).await;
    match envelope.body {
        MessageBody::Logon { .. } => {}
        other => panic!("expected Logon, got {other:?}"),
    }

    let ack = codec::Envelope {
        header: RequestHeader::new(99, "client-refresh"),
        body: MessageBody::LogonAck(codec::LogonAck {
            success: true,
            message: String::new(),
        }),
    };
    send_to(&mut router, &identity, &ack).await;

    // Short enough expiry that `0.2 * 0.1` schedules the refresh almost
    // immediately, well inside the test's recv timeout below.
    let grant = codec::Envelope {
        header: RequestHeader::new(99, "client-refresh"),
        body: MessageBody::AuthorizationGrant(codec::AuthorizationGrant {
            access_token: "tok-1".into(),
            refresh_token: "refresh-1".into(),
            expires_in: 0.2,
        }),
    };
    send_to(&mut router, &identity, &grant).await;

    let (_identity, envelope) = recv_envelope(&mut router).await;
    match envelope.body {
        MessageBody::AuthorizationRefresh { refresh_token } => {
            assert_eq!(refresh_token, "refresh-1");
            assert_eq!(envelope.header.client_id, 99);
            assert_eq!(envelope.header.sender_comp_id, "client-refresh");
        }
        other => panic!("expected AuthorizationRefresh, got {other:?}"),
    }

    connection.stop();
    connection.cleanup().await;
}

async fn send_to(router: &mut RouterSocket, identity: &bytes::Bytes, envelope: &codec::Envelope) {
    let bytes = codec::encode(envelope).unwrap();
    let mut msg = ZmqMessage::from(identity.clone());
    msg.push_back(bytes.into());
    router.send(msg).await.expect("router send");
}

async fn recv_envelope(router: &mut RouterSocket) -> (bytes::Bytes, codec::Envelope) {
    let msg = router.recv().await.expect("router recv");
    let mut frames = msg.into_vec();
    // First frame is the DEALER's identity, prepended transparently by
    // the transport library; the second is the payload.
    let identity = frames.remove(0);
    let payload = frames.remove(0);
    let envelope = codec::parse(&payload).expect("decode envelope");
    (identity, envelope)
}
