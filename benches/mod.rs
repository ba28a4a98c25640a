use criterion::{criterion_group, criterion_main};

mod auth;
mod network;

criterion_group!(
    benches,
    network::application::http::parser::bench_parse_single_call,
    network::application::http::parser::bench_parse_small_reads,
    auth::bench_sign_header
);
criterion_main!(benches);
