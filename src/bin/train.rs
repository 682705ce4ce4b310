//! Training entry point binary.
//!
//! Invoked with no arguments by the training environment. Exits `0` when the
//! training program succeeds and `255` otherwise, leaving the reason in
//! `<output_root>/failure`.

use training_pipeline::entrypoint::{
    run_entry_point, write_failure, EntryPointConfig, FAILURE_EXIT_CODE,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // Failure reports carry a backtrace
    if std::env::var_os("RUST_LIB_BACKTRACE").is_none() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = EntryPointConfig::from_env();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let report = format!("Exception during training: failed to start runtime: {}", e);
            eprintln!("{}", report);
            let _ = write_failure(&config.output_root, &report);
            std::process::exit(FAILURE_EXIT_CODE);
        }
    };

    let code = runtime.block_on(run_entry_point(&config));
    std::process::exit(code);
}
