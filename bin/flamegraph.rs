use qbench::{Args, Harness, RunConfig};

// Heavy fixed workload with no console output, for profiling under
// `cargo flamegraph --bin flamegraph`.
fn main() {
    let args = Args {
        workers: 12,
        iterations: 2_000_000,
        queue_size: 1_024,
        num_cpus: 0,
        ..Args::default()
    };

    let report = Harness::new(RunConfig::resolve(&args))
        .run()
        .expect("profiling run failed");

    std::hint::black_box(report);
}
