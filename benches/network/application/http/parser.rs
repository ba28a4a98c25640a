use std::hint::black_box;

use criterion::{Criterion, Throughput};
use libtrack::network::application::http::parser::{Progress, ResponseParser};

fn build_response(body_len: usize) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {body_len}\r\n\r\n"
    )
    .into_bytes();
    response.extend(std::iter::repeat_n(b'x', body_len));
    response
}

pub fn bench_parse_single_call(c: &mut Criterion) {
    let response = build_response(4096);
    let mut group = c.benchmark_group("http_parser");
    group.throughput(Throughput::Bytes(response.len() as u64));
    group.bench_function("single_call", |b| {
        b.iter(|| {
            let mut parser = ResponseParser::new();
            let mut body_bytes = 0usize;
            let progress = parser
                .parse(black_box(&response), &mut |event| {
                    if let libtrack::network::application::http::parser::Event::Body {
                        chunk, ..
                    } = event
                    {
                        body_bytes += chunk.len();
                    }
                    false
                })
                .unwrap();
            assert!(matches!(progress, Progress::Complete));
            black_box(body_bytes)
        })
    });
    group.finish();
}

/// Drives the caller side of the resumption protocol with 128-byte reads,
/// the shape the parser sees on a real TLS stream.
pub fn bench_parse_small_reads(c: &mut Criterion) {
    let response = build_response(4096);
    let mut group = c.benchmark_group("http_parser");
    group.throughput(Throughput::Bytes(response.len() as u64));
    group.bench_function("resumed_128b_reads", |b| {
        b.iter(|| {
            let mut parser = ResponseParser::new();
            let mut buf = [0u8; 256];
            let mut len = 0usize;
            let mut offset = 0usize;
            loop {
                let take = (buf.len() - len).min(128).min(response.len() - offset);
                buf[len..len + take].copy_from_slice(&response[offset..offset + take]);
                len += take;
                offset += take;
                match parser.parse(&buf[..len], &mut |_| false).unwrap() {
                    Progress::Complete => break,
                    Progress::Interrupted => unreachable!(),
                    Progress::NeedMore(consumed) => {
                        buf.copy_within(consumed..len, 0);
                        len -= consumed;
                    }
                }
            }
            black_box(offset)
        })
    });
    group.finish();
}
