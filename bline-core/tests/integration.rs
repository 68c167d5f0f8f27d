//! Integration tests: a full strip driving real UDP receivers on
//! localhost.

use std::time::Duration;

use bline_core::{BlineError, Brightness, LedStrip, Rgb, SegmentConfig, StripConfig};
use tokio::net::UdpSocket;

// ── Helpers ──────────────────────────────────────────────────────

/// Bind a fake controller on an OS-assigned port.
async fn fake_controller() -> (UdpSocket, u16) {
    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = sock.local_addr().unwrap().port();
    (sock, port)
}

/// Receive one datagram, failing the test after five seconds.
async fn recv_datagram(sock: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; 65_536];
    let (len, _) = tokio::time::timeout(Duration::from_secs(5), sock.recv_from(&mut buf))
        .await
        .expect("timeout")
        .expect("recv failed");
    buf.truncate(len);
    buf
}

// ── Frame delivery ───────────────────────────────────────────────

#[tokio::test]
async fn test_two_segment_frame() {
    let (ctl_a, port_a) = fake_controller().await;
    let (ctl_b, port_b) = fake_controller().await;

    let config = StripConfig::new(vec![
        SegmentConfig::new("127.0.0.1", port_a, 3),
        SegmentConfig::new("127.0.0.1", port_b, 2).reversed(),
    ]);
    let mut strip = LedStrip::connect(&config, Brightness::from_level(255))
        .await
        .unwrap();
    assert_eq!(strip.led_count(), 5);
    assert_eq!(strip.as_bytes().len(), 15);

    for (i, c) in [0xFF0000, 0x00FF00, 0x0000FF, 0x112233, 0x445566]
        .into_iter()
        .enumerate()
    {
        strip.set_pixel(i, c).unwrap();
    }
    let stats = strip.flush().await.unwrap();
    assert_eq!(stats.segments_sent, 2);

    assert_eq!(recv_datagram(&ctl_a).await, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
    assert_eq!(
        recv_datagram(&ctl_b).await,
        vec![0x44, 0x55, 0x66, 0x11, 0x22, 0x33]
    );

    strip.close().await.unwrap();
}

#[tokio::test]
async fn test_dimmed_frames_from_json_config() {
    let (ctl, port) = fake_controller().await;

    let json = format!(
        r#"{{"Servers": [{{"Address": "127.0.0.1", "Port": {port}, "LedCount": 2, "Reverse": false}}]}}"#
    );
    let config = StripConfig::from_json(&json).unwrap();

    let mut strip = LedStrip::connect(&config, Brightness::from_level(128))
        .await
        .unwrap();
    strip.set_pixel(0, 0xC8C8C8).unwrap();
    strip.set_pixel(1, 0x0A0B0C).unwrap();

    strip.flush().await.unwrap();
    assert_eq!(recv_datagram(&ctl).await, vec![100, 100, 100, 5, 5, 6]);

    strip.clear();
    assert_eq!(strip.get_pixel(0).unwrap(), Rgb::BLACK);
    strip.flush().await.unwrap();
    assert_eq!(recv_datagram(&ctl).await, vec![0; 6]);
}

#[tokio::test]
async fn test_consecutive_frames_in_order() {
    let (ctl, port) = fake_controller().await;
    let config = StripConfig::new(vec![SegmentConfig::new("127.0.0.1", port, 1)]);
    let mut strip = LedStrip::connect(&config, Brightness::FULL).await.unwrap();

    for level in 1u32..=5 {
        strip.set_pixel(0, level).unwrap();
        strip.flush().await.unwrap();
    }
    for level in 1u8..=5 {
        assert_eq!(recv_datagram(&ctl).await, vec![0, 0, level]);
    }
    assert_eq!(strip.stats().total_frames(), 5);
}

// ── Setup failures ───────────────────────────────────────────────

#[test]
fn test_empty_address_aborts_setup() {
    let config = StripConfig::new(vec![
        SegmentConfig::new("127.0.0.1", 9, 4),
        SegmentConfig::new("", 9, 4),
    ]);
    let result = tokio_test::block_on(LedStrip::connect(&config, Brightness::FULL));
    assert!(matches!(result, Err(BlineError::Address)));
}

#[tokio::test]
async fn test_unresolvable_host_aborts_setup() {
    let config = StripConfig::new(vec![SegmentConfig::new("strip.invalid", 7777, 4)]);
    let result = LedStrip::connect(&config, Brightness::FULL).await;
    assert!(matches!(result, Err(BlineError::Resolution { .. })));
}

#[tokio::test]
async fn test_oversized_segment_aborts_setup() {
    let config = StripConfig::new(vec![SegmentConfig::new("127.0.0.1", 9, 100_000)]);
    let result = LedStrip::connect(&config, Brightness::FULL).await;
    assert!(matches!(result, Err(BlineError::Config(_))));
}
