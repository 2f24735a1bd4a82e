//! Benchmarks for DNS message decoding.
//!
//! Measures the full decoder over a representative response packet with
//! name compression and an EDNS OPT record.

use criterion::{BenchmarkId, Criterion, Throughput, black_box};

use horizon::wire::Message;

fn build_dns_response() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&[0x12, 0x34]); // ID
    buf.extend_from_slice(&[0x81, 0x80]); // response, RD, RA
    buf.extend_from_slice(&[0x00, 0x01]); // questions
    buf.extend_from_slice(&[0x00, 0x02]); // answers
    buf.extend_from_slice(&[0x00, 0x00]); // authority
    buf.extend_from_slice(&[0x00, 0x01]); // additional

    // Question: example.com A IN
    buf.extend_from_slice(&[0x07]);
    buf.extend_from_slice(b"example");
    buf.extend_from_slice(&[0x03]);
    buf.extend_from_slice(b"com");
    buf.push(0);
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);

    // Answer: CNAME to www.example.com (compressed)
    buf.extend_from_slice(&[0xC0, 0x0C]);
    buf.extend_from_slice(&[0x00, 0x05, 0x00, 0x01]);
    buf.extend_from_slice(&300u32.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x06, 0x03]);
    buf.extend_from_slice(b"www");
    buf.extend_from_slice(&[0xC0, 0x0C]);

    // Answer: A record
    buf.extend_from_slice(&[0xC0, 0x0C]);
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    buf.extend_from_slice(&300u32.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x04, 93, 184, 216, 34]);

    // Additional: OPT, payload size 4096
    buf.push(0);
    buf.extend_from_slice(&[0x00, 0x29, 0x10, 0x00]);
    buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    buf.extend_from_slice(&[0x00, 0x00]);

    buf
}

fn bench_decode(c: &mut Criterion) {
    let response = build_dns_response();

    let mut group = c.benchmark_group("wire");
    group.throughput(Throughput::Bytes(response.len() as u64));

    group.bench_function(BenchmarkId::new("decode", "response"), |b| {
        b.iter(|| Message::decode(black_box(&response)).unwrap())
    });

    group.finish();
}

fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    bench_decode(&mut criterion);
    criterion.final_summary();
}
