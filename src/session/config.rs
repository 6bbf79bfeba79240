use std::time::Duration;

/// Tuning knobs for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between speaking-rate samples
    pub sample_interval: Duration,

    /// Settle delay between transcription listening sessions
    pub restart_delay: Duration,

    /// Grace window before auxiliary audio feedback is restored after the
    /// engine reports ready
    pub ready_grace: Duration,

    /// Consecutive listening-session arm failures tolerated before
    /// transcription is given up for the rest of the session
    pub max_arm_failures: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(3),
            restart_delay: Duration::from_millis(100),
            ready_grace: Duration::from_secs(1),
            max_arm_failures: 5,
        }
    }
}
