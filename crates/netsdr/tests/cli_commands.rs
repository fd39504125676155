#![cfg(feature = "cli")]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const START_PREFIX: [u8; 5] = [0x08, 0x00, 0x18, 0x00, 0x80];
const STOP_PREFIX: [u8; 5] = [0x08, 0x00, 0x18, 0x00, 0x00];

fn unique_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "netsdr-cli-{tag}-{}-{}.bin",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn free_udp_addr() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("udp bind should succeed");
    socket.local_addr().expect("local addr should be available")
}

fn closed_tcp_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("tcp bind should succeed");
    listener.local_addr().expect("local addr").port()
}

/// Minimal receiver: echoes control items as acknowledgements and streams
/// 16-bit sample datagrams to `data_target` between start and stop.
fn spawn_device(data_target: SocketAddr) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("tcp bind should succeed");
    let control_addr = listener.local_addr().expect("local addr");
    let streaming = Arc::new(AtomicBool::new(false));
    let done = Arc::new(AtomicBool::new(false));

    {
        let streaming = streaming.clone();
        let done = done.clone();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8194];
                loop {
                    let n = match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    let msg = &buf[..n];
                    if msg.starts_with(&START_PREFIX) {
                        streaming.store(true, Ordering::SeqCst);
                    } else if msg.starts_with(&STOP_PREFIX) {
                        streaming.store(false, Ordering::SeqCst);
                    }
                    if stream.write_all(msg).is_err() {
                        break;
                    }
                }
            }
            streaming.store(false, Ordering::SeqCst);
            done.store(true, Ordering::SeqCst);
        });
    }

    thread::spawn(move || {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("udp bind should succeed");
        let mut sequence: u16 = 0;
        while !done.load(Ordering::SeqCst) {
            if streaming.load(Ordering::SeqCst) {
                let [lo, hi] = sequence.to_le_bytes();
                let _ = socket.send_to(&[0x08, 0x80, lo, hi, 1, 0, 2, 0], data_target);
                sequence = sequence.wrapping_add(1);
            }
            thread::sleep(Duration::from_millis(5));
        }
    });

    control_addr
}

#[test]
fn version_prints_name_and_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_netsdr"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("netsdr "), "stdout: {stdout}");
}

#[test]
fn capture_against_device_writes_samples() {
    let data_addr = free_udp_addr();
    let device = spawn_device(data_addr);
    let sample_file = unique_path("capture");

    let output = Command::new(env!("CARGO_BIN_EXE_netsdr"))
        .args(["--log-level", "error", "--format", "json", "capture"])
        .args(["--host", "127.0.0.1", "--port", &device.port().to_string()])
        .args(["--data-bind", &data_addr.to_string()])
        .arg("--output")
        .arg(&sample_file)
        .args(["--frequency", "14200000", "--duration", "400ms"])
        .args(["--request-timeout", "5s"])
        .output()
        .expect("capture should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary should be JSON");
    assert_eq!(summary["frequency_hz"], 14_200_000);
    assert_eq!(summary["channel"], 1);
    // Three configuration requests, tune, start, stop.
    assert_eq!(summary["requests_sent"], 6);
    assert_eq!(summary["responses_received"], 6);

    let samples = summary["samples_written"].as_u64().expect("samples count");
    assert!(samples > 0, "no samples captured");

    let written = std::fs::read(&sample_file).expect("sample file should exist");
    assert_eq!(written.len() as u64, summary["bytes_written"].as_u64().unwrap());
    assert_eq!(&written[..4], &[1, 0, 2, 0]);

    let _ = std::fs::remove_file(&sample_file);
}

#[test]
fn capture_without_device_exits_with_transport_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_netsdr"))
        .args(["--log-level", "error", "capture"])
        .args(["--host", "127.0.0.1", "--port", &closed_tcp_port().to_string()])
        .arg("--output")
        .arg(unique_path("refused"))
        .args(["--frequency", "7000000", "--duration", "1s"])
        .output()
        .expect("capture should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"), "stderr: {stderr}");
}

#[test]
fn capture_rejects_bad_duration() {
    let output = Command::new(env!("CARGO_BIN_EXE_netsdr"))
        .args(["--log-level", "error", "capture"])
        .args(["--frequency", "7000000", "--duration", "forever"])
        .output()
        .expect("capture should run");

    assert_eq!(output.status.code(), Some(64));
}
