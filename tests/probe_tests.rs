use std::io::Write;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use recon_scan_rs::config::{Tool, ToolConfig};
use recon_scan_rs::probe::http::USER_AGENT;
use recon_scan_rs::probe::{DnsProbe, HostProbe, PathProbe, Probe};
use recon_scan_rs::types::Measurement;
use recon_scan_rs::{recon, summary};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TIMEOUT: Duration = Duration::from_millis(800);

/// Listener that accepts and immediately drops connections.
async fn open_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn closed_port() -> u16 {
    let (listener, port) = open_port().await;
    drop(listener);
    port
}

fn keep_accepting(listener: TcpListener) {
    tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            drop(sock);
        }
    });
}

/// Minimal HTTP/1.1 server: `/admin` 403, `/old` 301, `/ok` 200, anything else 404.
async fn http_fixture() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                loop {
                    match sock.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let req = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = req.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = match path.as_str() {
                    "/admin" => ("403 Forbidden", "no"),
                    "/old" => ("301 Moved Permanently", ""),
                    "/ok" => ("200 OK", "hello"),
                    _ => ("404 Not Found", "missing"),
                };
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nLocation: /new\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    addr
}

/// Accepts connections and holds them open without ever answering.
async fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    addr
}

/// Slack allowed on top of the configured timeout before a run counts as hung.
const MARGIN: Duration = Duration::from_secs(2);

fn local_path_probe(addr: SocketAddr) -> PathProbe {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT)
        .no_proxy()
        .build()
        .unwrap();
    PathProbe::with_client(client, format!("http://{addr}/")).unwrap()
}

#[tokio::test]
async fn host_probe_open_port_is_positive() {
    let (listener, port) = open_port().await;
    keep_accepting(listener);

    let out = HostProbe::new(port)
        .probe("127.0.0.1".parse::<std::net::IpAddr>().unwrap(), TIMEOUT)
        .await;
    assert!(out.positive, "{out:?}");
    assert_eq!(out.target, "127.0.0.1");
    match out.measurement {
        Some(Measurement::Rtt { peer, .. }) => assert_eq!(peer.map(|p| p.port()), Some(port)),
        other => panic!("expected rtt, got {other:?}"),
    }
}

#[tokio::test]
async fn fallback_port_distinguishes_reachability() {
    let (listener, open) = open_port().await;
    keep_accepting(listener);
    let closed = closed_port().await;

    let without = HostProbe::new(closed)
        .probe("127.0.0.1".to_string(), TIMEOUT)
        .await;
    assert!(!without.positive);
    assert!(without.error.is_some());

    let with = HostProbe::new(closed)
        .with_fallback(open)
        .probe("127.0.0.1".to_string(), TIMEOUT)
        .await;
    assert!(with.positive, "{with:?}");
    match with.measurement {
        Some(Measurement::Rtt { peer, .. }) => assert_eq!(peer.map(|p| p.port()), Some(open)),
        other => panic!("expected rtt, got {other:?}"),
    }
}

#[tokio::test]
async fn port_scan_reports_every_port() {
    let (listener, open) = open_port().await;
    keep_accepting(listener);
    let closed = closed_port().await;

    let cfg = ToolConfig::for_tool(Tool::Ports).with_overrides(Some(4), Some(800));
    let spec = format!("{open},{closed}");
    let res = recon::scan_ports("127.0.0.1", Some(&spec), &cfg).await.unwrap();
    assert_eq!(res.entries.len(), 2);

    let s = summary::summarize(&res);
    assert_eq!(s.positive, 1);
    assert_eq!(s.positives[0].target, open.to_string());
}

#[tokio::test]
async fn ping_uses_requested_port() {
    let (listener, port) = open_port().await;
    keep_accepting(listener);
    let cfg = ToolConfig::for_tool(Tool::Ping);
    let out = recon::ping("127.0.0.1", port, &cfg).await.unwrap();
    assert!(out.positive);
    assert!(out.rtt_ms().is_some());
}

#[tokio::test]
async fn http_status_classification() {
    let addr = http_fixture().await;
    let probe = local_path_probe(addr);

    let admin = probe.probe("admin".to_string(), TIMEOUT).await;
    assert!(admin.positive, "{admin:?}");
    assert_eq!(
        admin.measurement,
        Some(Measurement::Http {
            status: 403,
            size: Some(2)
        })
    );

    let old = probe.probe("/old".to_string(), TIMEOUT).await;
    assert!(old.positive);
    assert_eq!(old.status(), Some(301));

    let missing = probe.probe("nope".to_string(), TIMEOUT).await;
    assert!(!missing.positive);
    assert_eq!(missing.status(), Some(404));
    assert!(missing.error.is_none());
}

#[tokio::test]
async fn http_network_failure_is_negative_without_status() {
    let closed = closed_port().await;
    let probe = local_path_probe(SocketAddr::from(([127, 0, 0, 1], closed)));
    let out = probe.probe("admin".to_string(), TIMEOUT).await;
    assert!(!out.positive);
    assert_eq!(out.status(), None);
    assert!(out.error.is_some());
}

#[tokio::test]
async fn dir_bust_keeps_found_paths() {
    let addr = http_fixture().await;
    let mut words = tempfile::NamedTempFile::new().unwrap();
    write!(words, "admin\n# skip me\nold\nok\nmissing\n").unwrap();

    let cfg = ToolConfig::for_tool(Tool::Dirs).with_overrides(Some(2), Some(800));
    let res = recon::bust_dirs_with(local_path_probe(addr), Some(words.path()), &cfg)
        .await
        .unwrap();
    assert_eq!(res.entries.len(), 4);

    let mut found: Vec<String> = summary::positives(&res)
        .into_iter()
        .map(|e| e.target)
        .collect();
    found.sort();
    assert_eq!(found, vec!["admin", "ok", "old"]);
}

#[tokio::test]
async fn dns_localhost_resolves() {
    let out = DnsProbe
        .probe("localhost".to_string(), Duration::from_secs(3))
        .await;
    assert!(out.positive, "{out:?}");
    match out.measurement {
        Some(Measurement::Addresses { ips }) => assert!(ips.iter().all(|ip| ip.is_loopback())),
        other => panic!("expected addresses, got {other:?}"),
    }
}

#[tokio::test]
async fn dns_failure_is_negative_with_error() {
    let out = DnsProbe
        .probe("no-such-host.invalid".to_string(), Duration::from_secs(3))
        .await;
    assert!(!out.positive);
    assert!(out.error.is_some());
    assert!(out.measurement.is_none());
}

#[tokio::test]
async fn resolve_qualifies_bare_labels() {
    let cfg = ToolConfig::for_tool(Tool::Resolve).with_overrides(None, Some(3000));
    let out = recon::resolve("no-such-label", Some("invalid"), &cfg)
        .await
        .unwrap();
    assert_eq!(out.target, "no-such-label.invalid");
    assert!(!out.positive);
}

#[tokio::test]
async fn http_silent_server_times_out() {
    let addr = silent_server().await;
    let timeout = Duration::from_millis(300);

    let started = Instant::now();
    let out = local_path_probe(addr).probe("admin".to_string(), timeout).await;
    let elapsed = started.elapsed();

    assert!(!out.positive, "{out:?}");
    assert_eq!(out.status(), None);
    assert!(out.error.is_some());
    assert!(elapsed >= timeout, "returned before the deadline: {elapsed:?}");
    assert!(elapsed < timeout + MARGIN, "took {elapsed:?}");
}

#[tokio::test]
async fn dir_bust_against_silent_server_stays_bounded() {
    let addr = silent_server().await;
    let mut words = tempfile::NamedTempFile::new().unwrap();
    write!(words, "a\nb\nc\nd\n").unwrap();

    let cfg = ToolConfig::for_tool(Tool::Dirs).with_overrides(Some(4), Some(300));
    let started = Instant::now();
    let res = recon::bust_dirs_with(local_path_probe(addr), Some(words.path()), &cfg)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(res.entries.len(), 4);
    assert!(res.entries.iter().all(|e| !e.positive && e.error.is_some()));
    assert!(elapsed < cfg.timeout() + MARGIN, "took {elapsed:?}");
}

#[tokio::test]
async fn tcp_connect_to_blackhole_is_bounded() {
    // 10.255.255.1 is normally unrouted; either the SYN goes nowhere and the
    // timeout fires, or the stack refuses at once. Both are negative.
    let timeout = Duration::from_millis(200);
    let started = Instant::now();
    let out = HostProbe::new(80)
        .probe("10.255.255.1".parse::<std::net::IpAddr>().unwrap(), timeout)
        .await;
    let elapsed = started.elapsed();

    assert!(!out.positive, "{out:?}");
    assert!(out.error.is_some());
    assert!(out.measurement.is_none());
    assert!(elapsed < timeout + MARGIN, "took {elapsed:?}");
}

#[tokio::test]
async fn dns_zero_timeout_is_negative_and_prompt() {
    let started = Instant::now();
    let out = DnsProbe
        .probe("no-such-host.invalid".to_string(), Duration::ZERO)
        .await;
    let elapsed = started.elapsed();

    assert!(!out.positive);
    assert!(out.error.is_some());
    assert!(out.measurement.is_none());
    assert!(elapsed < MARGIN, "took {elapsed:?}");
}
