//! Sender to receiver over the loopback interface.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use emanate_ccx::protocol::{parse, Packet};
use emanate_ccx::transport::{Receiver, Sender, Transport, UdpTransport};
use emanate_ccx::types::UtilState;

const WAIT: Duration = Duration::from_secs(5);

async fn loopback_receiver() -> Receiver<UdpTransport> {
    Receiver::bind("127.0.0.1:0".parse().unwrap(), 2048)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_packet_survives_loopback() {
    let receiver = loopback_receiver().await;
    let port = receiver.local_addr().unwrap().port();

    let mut packet = Packet::new();
    packet.set_sequence(42);
    packet.set_temperature(7.25);
    packet.set_util_state(UtilState::Off).unwrap();
    let data = packet.encode();

    let sender = Sender::connect("127.0.0.1", port).await.unwrap();
    sender.transmit(&data).await.unwrap();

    let update = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
    assert_eq!(update.data, data);
    assert_eq!(
        update.remote_addr.port(),
        sender.transport().local_addr().unwrap().port()
    );

    let parsed = parse(&update.data).unwrap();
    assert_eq!(parsed.fixed, packet.fixed_region());
    assert_eq!(parsed.statuses().next(), Some("UTIL_STATE=PLUGGED_IN_OFF"));
}

#[tokio::test]
async fn test_datagrams_are_not_padded() {
    let receiver = loopback_receiver().await;
    let port = receiver.local_addr().unwrap().port();
    let sender = Sender::connect("127.0.0.1", port).await.unwrap();

    // A long datagram followed by a short one must not leak bytes into the second
    let mut long = Packet::new();
    long.push_status(&"A".repeat(100)).unwrap();
    sender.transmit(&long.encode()).await.unwrap();
    let short = Packet::new().encode();
    sender.transmit(&short).await.unwrap();

    let first = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
    let second = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
    assert_eq!(first.data.len(), long.encoded_len());
    assert_eq!(second.data, short);
    assert!(parse(&second.data).unwrap().telemetry.is_empty());
}

#[tokio::test]
async fn test_run_delivers_burst_until_shutdown() {
    let receiver = loopback_receiver().await;
    let port = receiver.local_addr().unwrap().port();

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        receiver
            .run(
                move |update| {
                    let _ = seen_tx.send(update);
                },
                shutdown_rx,
            )
            .await
    });

    let mut packet = Packet::new();
    packet.set_burst_length(3);
    packet.set_button_pressed().unwrap();
    let data = packet.encode();

    let sender = Sender::connect("127.0.0.1", port).await.unwrap();
    sender
        .transmit_burst(&data, 2, Duration::from_millis(10))
        .await
        .unwrap();

    for _ in 0..3 {
        let update = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
        assert_eq!(update.data, data);
    }

    shutdown_tx.send(()).unwrap();
    timeout(WAIT, handle).await.unwrap().unwrap().unwrap();
}
