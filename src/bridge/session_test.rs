use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::*;
use crate::report::output::LEN as OUTPUT_LEN;

async fn accept_one() -> (TcpStream, SocketAddr, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server, remote) = listener.accept().await.unwrap();
    (server, remote, client)
}

#[tokio::test]
async fn decodes_a_full_input_frame() {
    let (server, remote, mut client) = accept_one().await;
    let (tx, mut rx) = mpsc::channel(8);
    let _session = Session::spawn(server, remote, tx);

    let mut frame = vec![0x01u8];
    frame.extend_from_slice(&[0x42u8; INPUT_WIRE_LEN - 1]);
    client.write_all(&frame).await.unwrap();

    let (from, decoded) = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(from, remote);
    let SessionFrame::Input(bytes) = decoded else {
        panic!("expected Input frame")
    };
    assert_eq!(bytes[0], 0x01);
    assert_eq!(bytes[1], 0x42);
}

#[tokio::test]
async fn decodes_shutdown_opcode() {
    let (server, remote, mut client) = accept_one().await;
    let (tx, mut rx) = mpsc::channel(8);
    let _session = Session::spawn(server, remote, tx);

    client.write_all(&[0xFF]).await.unwrap();

    let (_, decoded) = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decoded, SessionFrame::Shutdown);
}

#[tokio::test]
async fn drops_frames_with_unrecognized_opcode_or_wrong_length() {
    let (server, remote, mut client) = accept_one().await;
    let (tx, mut rx) = mpsc::channel(8);
    let _session = Session::spawn(server, remote, tx);

    // Unrecognized opcode.
    client.write_all(&[0x02, 0x00]).await.unwrap();
    // Right opcode, wrong length.
    let mut short = vec![0x01u8];
    short.extend_from_slice(&[0u8; 10]);
    client.write_all(&short).await.unwrap();
    // A well-formed frame to prove the connection is still alive.
    let mut frame = vec![0x01u8];
    frame.extend_from_slice(&[0u8; INPUT_WIRE_LEN - 1]);
    client.write_all(&frame).await.unwrap();

    let (_, decoded) = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(decoded, SessionFrame::Input(_)));
}

#[tokio::test]
async fn send_output_writes_exactly_forty_eight_bytes() {
    let (server, remote, mut client) = accept_one().await;
    let (tx, _rx) = mpsc::channel(8);
    let mut session = Session::spawn(server, remote, tx);

    let payload = [0x07u8; OUTPUT_LEN];
    assert!(session.send_output(&payload).await);

    let mut buf = [0u8; OUTPUT_LEN];
    timeout(
        Duration::from_secs(1),
        tokio::io::AsyncReadExt::read_exact(&mut client, &mut buf),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(buf, payload);
}

#[tokio::test]
async fn send_output_fails_after_peer_closes() {
    let (server, remote, client) = accept_one().await;
    let (tx, mut rx) = mpsc::channel(8);
    let mut session = Session::spawn(server, remote, tx);

    drop(client);
    // Give the read task a chance to observe the close.
    assert!(rx.recv().await.is_none() || true);
    for _ in 0..50 {
        if session.is_released() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(session.is_released());
    assert!(!session.send_output(&[0u8; OUTPUT_LEN]).await);
}
