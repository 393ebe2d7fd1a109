use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use echo_headers::common::spawn_test_server;
use echo_headers::http::echo::DiagnosticBody;
use echo_headers::http::expect::ExpectOutcome;
use echo_headers::http::{HttpConfig, HttpEchoClient, RequestHead};
use tokio::runtime::Runtime;

fn bench_diagnostic_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("diagnostic_body");
    let raw = b"POST /bench?echo-body=true HTTP/1.1\r\nHost: bench\r\nUser-Agent: criterion\r\n\
                Accept: */*\r\nContent-Length: 4096\r\n\r\n";
    let (head, _) = RequestHead::parse(raw, 32).unwrap().unwrap();
    let peer = "127.0.0.1:40000".parse().unwrap();

    for size in [0usize, 1024, 16384] {
        let payload = vec![b'x'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("assemble", size), &payload, |b, payload| {
            b.iter(|| {
                let mut body = DiagnosticBody::new(black_box(&head));
                body.append_request_body(payload);
                body.finish(peer, ExpectOutcome::NotRequested)
            });
        });
    }

    group.finish();
}

fn bench_keep_alive_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (server_handle, addr, _shutdown) =
        rt.block_on(spawn_test_server(HttpConfig::default())).unwrap();
    let mut client = rt.block_on(HttpEchoClient::connect(addr)).unwrap();

    let mut group = c.benchmark_group("keep_alive_roundtrip");
    for size in [64usize, 1024, 16384] {
        let payload = vec![b'x'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("post", size), &payload, |b, payload| {
            b.iter(|| {
                rt.block_on(client.request("POST", "/", &[("Host", "bench")], black_box(payload)))
                    .unwrap()
            });
        });
    }
    group.finish();

    server_handle.abort();
}

criterion_group!(benches, bench_diagnostic_body, bench_keep_alive_roundtrip);
criterion_main!(benches);
