use std::time::Duration;

use async_trait::async_trait;
use resources::objects::installation::{InstallationState, InstallationStatus};
use thiserror::Error;
use tokio::time::{sleep, Instant};

use crate::step::ProgressSink;

/// Interval between two status samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Failure of a single status sample.
///
/// The transport classifies its own errors: a `Timeout` can happen when
/// the cluster is under high load while installing and is retried, any
/// other error aborts the wait.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("status request timed out: {0}")]
    Timeout(String),
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("timeout reached while waiting for installation to complete")]
    DeadlineExceeded,
    #[error("unexpected installation state: {0}")]
    ProtocolViolation(String),
    #[error("failed to get the installation status: {0}")]
    Sample(#[source] anyhow::Error),
}

/// Polling view onto the remote installation process.
#[async_trait]
pub trait StatusSource {
    async fn sample(&mut self) -> Result<InstallationStatus, SampleError>;

    /// Accumulated per-component error log, dumped as a diagnostic when
    /// the wait gives up.
    async fn error_log(&mut self) -> Result<String, SampleError>;
}

/// Watches the installation until it converges to a terminal state.
///
/// Phases are distinguished purely by the free-text status description:
/// a changed description closes the previous step and opens a new one,
/// an unchanged one emits nothing. A `timeout` of zero or `None` waits
/// forever.
pub struct InstallationWatcher {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl InstallationWatcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn wait<S, P>(&self, source: &mut S, sink: &mut P) -> Result<(), WaitError>
    where
        S: StatusSource + Send,
        P: ProgressSink + Send,
    {
        let deadline = self
            .timeout
            .filter(|timeout| !timeout.is_zero())
            .map(|timeout| Instant::now() + timeout);
        let mut current_desc = String::new();
        let mut error_reported = false;

        loop {
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                sink.failure();
                self.dump_error_log(source, sink).await;
                return Err(WaitError::DeadlineExceeded);
            }

            match source.sample().await {
                Ok(status) => {
                    tracing::debug!(state = %status.state, desc = %status.description, "sampled installation status");
                    match status.state {
                        InstallationState::Installed => {
                            if !current_desc.is_empty() {
                                sink.success();
                            }
                            sink.success();
                            return Ok(());
                        },
                        InstallationState::Error => {
                            // Consecutive Error samples are reported once,
                            // the installer retries failed components on its own.
                            if !error_reported {
                                error_reported = true;
                                sink.log_error(&format!(
                                    "{} failed, which may be OK. Will retry later...",
                                    status.description
                                ));
                                sink.log_info(
                                    "The installer error log is printed if the timeout is reached.",
                                );
                            }
                        },
                        InstallationState::InProgress => {
                            error_reported = false;
                            if status.description != current_desc {
                                if !current_desc.is_empty() {
                                    sink.success();
                                }
                                sink.start(&status.description);
                                current_desc = status.description;
                            }
                        },
                        InstallationState::Unknown => {
                            sink.log_info(
                                "Failed to get the installation status. Will retry later...",
                            );
                        },
                        state => {
                            sink.failure();
                            return Err(WaitError::ProtocolViolation(state.to_string()));
                        },
                    }
                },
                Err(SampleError::Timeout(cause)) => {
                    tracing::debug!(%cause, "status sample timed out");
                    sink.log_error("Could not get the installation status, retrying...");
                },
                Err(SampleError::Fatal(e)) => {
                    sink.failure();
                    return Err(WaitError::Sample(e));
                },
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn dump_error_log<S, P>(&self, source: &mut S, sink: &mut P)
    where
        S: StatusSource + Send,
        P: ProgressSink + Send,
    {
        match source.error_log().await {
            Ok(log) if !log.is_empty() => sink.log_error(&log),
            Ok(_) => {},
            Err(e) => sink.log_error(&format!("Could not fetch the installer error log: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::anyhow;

    use super::*;
    use crate::step::record::{Call, RecordingSink};

    struct ScriptedSource {
        samples: VecDeque<Result<InstallationStatus, SampleError>>,
        error_log: String,
    }

    impl ScriptedSource {
        fn new(samples: Vec<Result<InstallationStatus, SampleError>>) -> Self {
            Self {
                samples: samples.into(),
                error_log: String::new(),
            }
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn sample(&mut self) -> Result<InstallationStatus, SampleError> {
            self.samples
                .pop_front()
                .unwrap_or_else(|| panic!("sampled after the script was exhausted"))
        }

        async fn error_log(&mut self) -> Result<String, SampleError> {
            Ok(self.error_log.clone())
        }
    }

    fn status(state: InstallationState, desc: &str) -> Result<InstallationStatus, SampleError> {
        Ok(InstallationStatus {
            state,
            description: desc.to_owned(),
            ..InstallationStatus::default()
        })
    }

    fn watcher(timeout: Option<Duration>) -> InstallationWatcher {
        InstallationWatcher::new(timeout).with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn already_installed_returns_without_waiting() {
        let mut source = ScriptedSource::new(vec![status(InstallationState::Installed, "")]);
        let mut sink = RecordingSink::new();

        watcher(None).wait(&mut source, &mut sink).await.unwrap();
        // exactly one terminal transition
        assert_eq!(sink.calls, vec![Call::Success]);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_changes_are_reported_once() {
        let mut source = ScriptedSource::new(vec![
            status(InstallationState::InProgress, "step A"),
            status(InstallationState::InProgress, "step A"),
            status(InstallationState::InProgress, "step B"),
            status(InstallationState::Installed, ""),
        ]);
        let mut sink = RecordingSink::new();

        watcher(None).wait(&mut source, &mut sink).await.unwrap();
        assert_eq!(
            sink.calls,
            vec![
                Call::Start("step A".to_owned()),
                Call::Success,
                Call::Start("step B".to_owned()),
                Call::Success,
                Call::Success,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn error_suppression_resets_on_progress() {
        let mut source = ScriptedSource::new(vec![
            status(InstallationState::Error, "component x"),
            status(InstallationState::Error, "component x"),
            status(InstallationState::InProgress, "step A"),
            status(InstallationState::Error, "component y"),
            status(InstallationState::Installed, ""),
        ]);
        let mut sink = RecordingSink::new();

        watcher(None).wait(&mut source, &mut sink).await.unwrap();
        let reported = sink.count(|call| {
            matches!(call, Call::LogError(msg) if msg.contains("which may be OK"))
        });
        assert_eq!(reported, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_does_not_reset_error_suppression() {
        let mut source = ScriptedSource::new(vec![
            status(InstallationState::Error, "component x"),
            status(InstallationState::Unknown, ""),
            status(InstallationState::Error, "component x"),
            status(InstallationState::Installed, ""),
        ]);
        let mut sink = RecordingSink::new();

        watcher(None).wait(&mut source, &mut sink).await.unwrap();
        let reported = sink.count(|call| {
            matches!(call, Call::LogError(msg) if msg.contains("which may be OK"))
        });
        assert_eq!(reported, 1);
        let retries = sink.count(|call| matches!(call, Call::LogInfo(msg) if msg.contains("Will retry later") && msg.contains("installation status")));
        assert_eq!(retries, 1);
    }

    #[tokio::test]
    async fn deadline_takes_precedence_over_sampling() {
        // An empty script panics on the first sample, so reaching
        // DeadlineExceeded proves no sample was taken.
        let mut source = ScriptedSource::new(vec![]);
        source.error_log = "component-a:\n boom [3]".to_owned();
        let mut sink = RecordingSink::new();

        let err = watcher(Some(Duration::from_nanos(1)))
            .wait(&mut source, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::DeadlineExceeded));
        assert_eq!(
            sink.calls,
            vec![
                Call::Failure,
                Call::LogError("component-a:\n boom [3]".to_owned()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fails_the_open_phase_and_dumps_diagnostics() {
        let mut source = ScriptedSource::new(vec![status(InstallationState::InProgress, "step A")]);
        source.error_log = "component-a:\n boom [1]".to_owned();
        let mut sink = RecordingSink::new();

        let err = watcher(Some(Duration::from_millis(5)))
            .wait(&mut source, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::DeadlineExceeded));
        assert_eq!(
            sink.calls,
            vec![
                Call::Start("step A".to_owned()),
                Call::Failure,
                Call::LogError("component-a:\n boom [1]".to_owned()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_means_no_deadline() {
        let mut source = ScriptedSource::new(vec![
            status(InstallationState::InProgress, "step A"),
            status(InstallationState::Installed, ""),
        ]);
        let mut sink = RecordingSink::new();

        watcher(Some(Duration::ZERO))
            .wait(&mut source, &mut sink)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn transient_sample_timeout_is_retried() {
        let mut source = ScriptedSource::new(vec![
            Err(SampleError::Timeout("operation timed out".to_owned())),
            status(InstallationState::Installed, ""),
        ]);
        let mut sink = RecordingSink::new();

        watcher(None).wait(&mut source, &mut sink).await.unwrap();
        assert_eq!(
            sink.calls,
            vec![
                Call::LogError("Could not get the installation status, retrying...".to_owned()),
                Call::Success,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_sample_error_aborts_the_wait() {
        let mut source = ScriptedSource::new(vec![Err(SampleError::Fatal(anyhow!(
            "connection refused"
        )))]);
        let mut sink = RecordingSink::new();

        let err = watcher(None)
            .wait(&mut source, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Sample(_)));
        assert_eq!(sink.calls.last(), Some(&Call::Failure));
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_state_is_a_protocol_violation() {
        let mut source = ScriptedSource::new(vec![status(InstallationState::NotInstalled, "")]);
        let mut sink = RecordingSink::new();

        let err = watcher(None)
            .wait(&mut source, &mut sink)
            .await
            .unwrap_err();
        match err {
            WaitError::ProtocolViolation(state) => assert_eq!(state, "NotInstalled"),
            other => panic!("expected ProtocolViolation, got {:?}", other),
        }
        assert_eq!(sink.calls.last(), Some(&Call::Failure));
    }
}
