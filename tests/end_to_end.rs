//! End-to-end benchmark runs against a local mock endpoint.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use sparql_bench::compare;
use sparql_bench::config::BenchConfig;
use sparql_bench::corpus;
use sparql_bench::driver::BenchmarkDriver;
use sparql_bench::executor;

const MOCK_BODY: &[u8] = b"mock result";

/// Read one HTTP request (headers plus Content-Length body) from the stream.
fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while stream.read(&mut byte).unwrap() == 1 {
        head.push(byte[0]);
        if head.ends_with(b"\r\n\r\n") {
            break;
        }
    }

    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut request = httparse::Request::new(&mut headers);
    request.parse(&head).unwrap();
    assert_eq!(request.method, Some("POST"));

    let content_length = request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|h| std::str::from_utf8(h.value).ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = vec![0u8; content_length];
    stream.read_exact(&mut body).unwrap();
    body
}

fn handle_connection(mut stream: TcpStream, delay: Duration) -> Vec<u8> {
    let body = read_request(&mut stream);
    thread::sleep(delay);
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        MOCK_BODY.len()
    )
    .unwrap();
    stream.write_all(MOCK_BODY).unwrap();
    stream.flush().unwrap();
    body
}

/// Serve exactly `requests` POSTs with a fixed per-request latency, one
/// thread per connection so pooled repetitions overlap. Returns the request
/// bodies in accept order.
fn spawn_mock_endpoint(
    requests: usize,
    delay: Duration,
) -> (String, thread::JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut workers = Vec::new();
        for _ in 0..requests {
            let (stream, _) = listener.accept().unwrap();
            workers.push(thread::spawn(move || handle_connection(stream, delay)));
        }
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    (format!("http://{addr}"), handle)
}

fn config(endpoint: String, dir: &TempDir, pool_size: usize, iterations: usize) -> BenchConfig {
    BenchConfig {
        endpoint,
        queries_dir: dir.path().join("queries"),
        output_dir: dir.path().join("out"),
        pool_size,
        iterations,
        pacing: Duration::ZERO,
        capture_warm_up: true,
    }
}

fn run(config: &BenchConfig) -> usize {
    let groups = corpus::load_groups(&config.queries_dir).unwrap();
    let client = executor::build_client().unwrap();
    let mut driver = BenchmarkDriver::new(config, &client).unwrap();
    driver.run(&groups).unwrap()
}

#[test]
fn single_template_produces_one_row_and_one_summary_block() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("queries")).unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();
    std::fs::write(
        dir.path().join("queries/Q1.txt"),
        "SELECT ?x WHERE { ?x ?p ?o }\n\nASK { ?s ?p ?o }\n",
    )
    .unwrap();
    // Warm-up-only template: contributes a warm-up request, no timings.
    std::fs::write(dir.path().join("queries/Z9.txt"), "ASK { ?a ?b ?c }\n").unwrap();

    // Two warm-ups plus one measured query.
    let (endpoint, server) = spawn_mock_endpoint(3, Duration::ZERO);
    let config = config(endpoint, &dir, 1, 1);
    let measured = run(&config);
    assert_eq!(measured, 1);

    let bodies = server.join().unwrap();
    assert_eq!(bodies[0], b"SELECT ?x WHERE { ?x ?p ?o }\n");
    assert_eq!(bodies[1], b"ASK { ?a ?b ?c }\n");
    assert_eq!(bodies[2], b"ASK { ?s ?p ?o }\n");

    let timings = std::fs::read_to_string(config.output_dir.join("time.csv")).unwrap();
    let rows: Vec<&str> = timings.lines().collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("Q1,1,"), "unexpected row: {}", rows[0]);

    let summary = std::fs::read_to_string(config.output_dir.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 8, "only Q1 should have a summary block");

    // Single sample: min = mean = max and std = 0 for both metrics.
    for metric in 0..2 {
        let block: Vec<Vec<&str>> = rows[metric * 4..metric * 4 + 4]
            .iter()
            .map(|r| r.split(',').collect())
            .collect();
        assert_eq!(block[0][3], block[1][3], "min != mean");
        assert_eq!(block[0][3], block[3][3], "min != max");
        assert_eq!(block[2][3], "0.0000", "std of a single sample");
    }

    // Warm-up bodies captured for both templates.
    let captured = std::fs::read_to_string(config.output_dir.join("Q1-0.txt")).unwrap();
    assert_eq!(captured.as_bytes(), MOCK_BODY);
    assert!(config.output_dir.join("Z9-0.txt").is_file());
}

#[test]
fn pool_of_four_records_a_single_averaged_entry() {
    let delay = Duration::from_millis(40);
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("queries")).unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();
    std::fs::write(
        dir.path().join("queries/C3.txt"),
        "ASK { ?w ?p ?o }\n\nSELECT * WHERE { ?s ?p ?o }\n",
    )
    .unwrap();

    // One warm-up plus four concurrent repetitions of the measured query.
    let (endpoint, server) = spawn_mock_endpoint(5, delay);
    let mut config = config(endpoint, &dir, 4, 1);
    config.capture_warm_up = false;
    let measured = run(&config);
    assert_eq!(measured, 1);
    server.join().unwrap();

    assert!(!config.output_dir.join("C3-0.txt").exists());

    let timings = std::fs::read_to_string(config.output_dir.join("time.csv")).unwrap();
    let rows: Vec<&str> = timings.lines().collect();
    assert_eq!(rows.len(), 1, "four repetitions reduce to one entry");

    let fields: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(fields[0], "C3");
    assert_eq!(fields[1], "1");
    let ttfb: f64 = fields[2].parse().unwrap();
    let ttlb: f64 = fields[3].parse().unwrap();
    assert!(ttlb >= ttfb, "last byte before first byte: {ttfb} > {ttlb}");
    // Every repetition waits out the mock delay, so the average cannot be
    // below it; the upper bound is loose to tolerate slow CI.
    assert!(ttfb >= 0.040, "averaged ttfb below mock latency: {ttfb}");
    assert!(ttlb < 2.0, "averaged ttlb implausibly large: {ttlb}");
}

#[test]
fn summary_self_comparison_is_all_zero() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("queries")).unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();
    std::fs::write(
        dir.path().join("queries/R1.txt"),
        "ASK { ?w ?p ?o }\n\nq-a\n\nq-b\n",
    )
    .unwrap();

    // One warm-up plus two measured queries at two iterations each.
    let (endpoint, server) = spawn_mock_endpoint(5, Duration::ZERO);
    let config = config(endpoint, &dir, 1, 2);
    let measured = run(&config);
    assert_eq!(measured, 2);
    server.join().unwrap();

    let summary = config.output_dir.join("summary.csv");
    let diff = config.output_dir.join("diff.csv");
    let rows = compare::compare_files(&summary, &summary, &diff).unwrap();
    assert_eq!(rows, 8);

    let report = std::fs::read_to_string(&diff).unwrap();
    let mut lines = report.lines();
    assert_eq!(lines.next(), Some(compare::DIFF_HEADER));
    for line in lines {
        assert!(
            line.ends_with(",0.0000,0.0000"),
            "non-zero self diff: {line}"
        );
    }
}
