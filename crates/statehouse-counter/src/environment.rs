use std::time::Duration;

/// Dependencies handed to the reducer
#[derive(Debug, Clone)]
pub struct CounterEnvironment {
    /// Simulated latency of the remote counter
    pub fetch_delay: Duration,
    /// Value the remote counter reports
    pub remote_value: i64,
}

impl Default for CounterEnvironment {
    fn default() -> Self {
        Self {
            fetch_delay: Duration::from_millis(50),
            remote_value: 42,
        }
    }
}
