use std::fmt::Debug;
use std::time::Instant;

/// Route `tracing` output through the test harness's captured stdout.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hybrid_search=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Banner-style logger for long end-to-end scenarios.
pub struct TestLogger {
    test_name: String,
    start_time: Instant,
}

impl TestLogger {
    pub fn new(test_name: &str) -> Self {
        init_test_tracing();
        let separator = "=".repeat(60);
        println!("\n{separator}");
        println!("[TEST START] {test_name}");
        println!("{separator}");
        Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn step(&self, description: &str) {
        println!("[STEP +{:?}] {description}", self.start_time.elapsed());
    }

    pub fn log_input<T: Debug>(&self, name: &str, value: &T) {
        println!("[INPUT] {name}: {value:?}");
    }

    pub fn log_actual<T: Debug>(&self, value: &T) {
        println!("[ACTUAL] {value:?}");
    }

    pub fn pass(&self) {
        println!("[RESULT] {} PASSED in {:?}", self.test_name, self.start_time.elapsed());
        println!("{}\n", "=".repeat(60));
    }
}
