use std::hint::black_box;

use criterion::Criterion;
use libtrack::auth::{self, SignParams};
use libtrack::buffer::ByteBuffer;

pub fn bench_sign_header(c: &mut Criterion) {
    let params = SignParams {
        device_id: "1b25138b-c795-4b20-a724-59a40162d8fd",
        device_secret: "Ohkai3eF-im5UGai4J-bIPizRburaiLohr4DQNE6cvM",
        base_url: "tracking.api.here.com",
        nonce: "4723056724",
        timestamp: 1234567890,
    };
    c.bench_function("oauth_sign_header", |b| {
        b.iter(|| {
            let mut storage = [0u8; 512];
            let mut out = ByteBuffer::new(&mut storage);
            auth::write_header(black_box(&params), &mut out).unwrap();
            black_box(out.len())
        })
    });
}
