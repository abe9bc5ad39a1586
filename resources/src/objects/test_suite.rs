use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{Metadata, Object};

/// A batch of test executions, run by the in-cluster test controller.
/// Created by the CLI, mutated only by the controller afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TestSuite {
    /// Standard object's metadata.
    pub metadata: Metadata,
    /// Specification of which tests to run and how often.
    pub spec: TestSuiteSpec,
    /// Current status of the suite.
    pub status: Option<TestSuiteStatus>,
}

impl Object for TestSuite {
    fn kind(&self) -> &'static str {
        "TestSuite"
    }

    fn name(&self) -> &String {
        &self.metadata.name
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteSpec {
    /// How many times every test is executed.
    #[serde(default = "count_default")]
    pub count: i64,
    /// How many times a failing test is retried. A suite is still marked
    /// succeeded when a test fails first and succeeds on a retry.
    #[serde(default)]
    pub max_retries: i64,
    /// Number of tests executed in parallel.
    #[serde(default = "concurrency_default")]
    pub concurrency: i64,
    /// Restricts the suite to the selected test definitions.
    #[serde(default)]
    pub selectors: TestSelectors,
}

impl Default for TestSuiteSpec {
    fn default() -> Self {
        Self {
            count: count_default(),
            max_retries: 0,
            concurrency: concurrency_default(),
            selectors: TestSelectors::default(),
        }
    }
}

fn count_default() -> i64 {
    1
}

fn concurrency_default() -> i64 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestSelectors {
    #[serde(default)]
    pub match_names: Vec<TestDefReference>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TestDefReference {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TestSuiteStatus {
    /// At most one condition is ever true; once a terminal condition is
    /// true the suite no longer transitions.
    #[serde(default)]
    pub conditions: Vec<SuiteCondition>,
    /// One entry per scheduled test execution.
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl TestSuiteStatus {
    /// First condition reported true, if any.
    pub fn terminal_condition(&self) -> Option<SuiteConditionType> {
        self.conditions
            .iter()
            .find(|cond| cond.status)
            .map(|cond| cond.condition_type)
    }

    pub fn statistics(&self) -> TestStatistics {
        let mut stats = TestStatistics {
            total: self.results.len(),
            ..TestStatistics::default()
        };
        for result in &self.results {
            match result.status {
                TestStatus::Succeeded => stats.succeeded += 1,
                TestStatus::Failed => stats.failed += 1,
                TestStatus::Skipped => stats.skipped += 1,
                _ => {},
            }
        }
        stats
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SuiteCondition {
    #[serde(rename = "type")]
    pub condition_type: SuiteConditionType,
    pub status: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum SuiteConditionType {
    Succeeded,
    Error,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_name: String,
    pub status: TestStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TestStatus {
    Scheduled,
    Running,
    Unknown,
    Failed,
    Succeeded,
    Skipped,
}

/// Per-test progress counters of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestStatistics {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TestStatistics {
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

impl std::fmt::Display for TestStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} out of {} test(s) have finished (Succeeded: {}, Failed: {}, Skipped: {})...",
            self.finished(),
            self.total,
            self.succeeded,
            self.failed,
            self.skipped
        )
    }
}

/// A runnable test registered in the cluster.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TestDefinition {
    /// Standard object's metadata.
    pub metadata: Metadata,
}

impl Object for TestDefinition {
    fn kind(&self) -> &'static str {
        "TestDefinition"
    }

    fn name(&self) -> &String {
        &self.metadata.name
    }
}
