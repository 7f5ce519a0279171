// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0


use criterion::{criterion_group, criterion_main};
use fan_in_bench::bench_fan_in;
use multiplex_bench::{bench_multiplex_overhead, bench_multiplex_workload};

criterion_group!(
    mux_benches,
    bench_multiplex_workload,
    bench_multiplex_overhead,
    bench_fan_in
);
criterion_main!(mux_benches);
