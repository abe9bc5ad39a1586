use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use resources::{
    models::{Response, WatchEvent},
    objects::{
        installation::{Installation, InstallationState, InstallationStatus},
        test_suite::{TestDefinition, TestSuite},
        Object,
    },
};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    test::watch::{ListerWatcher, SuiteEventStream},
    utils::{gen_url, gen_watch_url},
    wait::{SampleError, StatusSource},
};

/// Well-known name of the singleton installation resource.
pub const INSTALLATION_NAME: &str = "stratus-installation";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .with_context(|| "Failed to build the api-server client")?;
        Ok(Self {
            client,
        })
    }

    pub async fn installation(&self) -> Result<Installation> {
        let url = gen_url(
            "installations".to_string(),
            Some(&INSTALLATION_NAME.to_string()),
        )?;
        let res = self
            .client
            .get(url)
            .send()
            .await?
            .json::<Response<Installation>>()
            .await?;
        res.data
            .ok_or_else(|| anyhow!("Installation '{}' not found", INSTALLATION_NAME))
    }

    /// Asks the installer to start installing. A no-op when an
    /// installation is already running.
    pub async fn activate_installation(&self) -> Result<()> {
        let installation = self.installation().await?;
        let state = installation
            .status
            .map(|status| status.state)
            .unwrap_or_default();
        if state == InstallationState::InProgress {
            return Ok(());
        }

        let url = gen_url(
            "installations".to_string(),
            Some(&INSTALLATION_NAME.to_string()),
        )?;
        let patch = serde_json::json!({"metadata": {"labels": {"action": "install"}}});
        let res = self
            .client
            .patch(url)
            .json(&patch)
            .send()
            .await?
            .json::<OpRes>()
            .await?;
        match res.cause {
            Some(cause) => Err(anyhow!("{}: {}", res.msg, cause)),
            None => Ok(()),
        }
    }

    pub async fn list_test_definitions(&self) -> Result<Vec<TestDefinition>> {
        let url = gen_url("testdefinitions".to_string(), None)?;
        let res = self
            .client
            .get(url)
            .send()
            .await?
            .json::<Response<Vec<TestDefinition>>>()
            .await?;
        Ok(res.data.unwrap_or_default())
    }

    pub async fn list_test_suites(&self) -> Result<Vec<TestSuite>> {
        let url = gen_url("testsuites".to_string(), None)?;
        let res = self
            .client
            .get(url)
            .send()
            .await?
            .json::<Response<Vec<TestSuite>>>()
            .await?;
        Ok(res.data.unwrap_or_default())
    }

    pub async fn create_test_suite(&self, suite: &TestSuite) -> Result<()> {
        let url = gen_url(suite.kind_plural(), None)?;
        let res = self
            .client
            .post(url)
            .json(suite)
            .send()
            .await?
            .json::<OpRes>()
            .await?;
        match res.cause {
            Some(cause) => Err(anyhow!("{}: {}", res.msg, cause)),
            None => Ok(()),
        }
    }

    /// Logs of the pod executing the named test.
    pub async fn pod_logs(&self, name: &str) -> Result<String> {
        let base_url = gen_url("pods".to_string(), Some(&name.to_string()))?;
        let res = self
            .client
            .get(format!("{}/logs", base_url))
            .send()
            .await?
            .json::<Response<String>>()
            .await?;
        Ok(res.data.unwrap_or_default())
    }

    pub async fn admin_credentials(&self) -> Result<AdminCredentials> {
        let url = gen_url("secrets".to_string(), Some(&"admin-user".to_string()))?;
        let res = self
            .client
            .get(url)
            .send()
            .await?
            .json::<Response<AdminCredentials>>()
            .await?;
        res.data
            .ok_or_else(|| anyhow!("Secret 'admin-user' not found"))
    }

    pub fn status_source(&self) -> InstallationStatusSource {
        InstallationStatusSource {
            client: self.client.clone(),
        }
    }

    /// List-then-watch collaborator over the named test suite.
    pub fn suite_lister_watcher(&self, name: &str) -> ListerWatcher {
        let lister_client = self.client.clone();
        let lister_name = name.to_owned();
        let watcher_name = name.to_owned();
        ListerWatcher {
            lister: Box::new(move |_| {
                let client = lister_client.clone();
                let name = lister_name.clone();
                Box::pin(async move {
                    let url = gen_url("testsuites".to_string(), None)?;
                    let res = client
                        .get(url)
                        .send()
                        .await?
                        .json::<Response<Vec<TestSuite>>>()
                        .await?;
                    Ok(res
                        .data
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|suite| suite.metadata.name == name)
                        .collect())
                })
            }),
            watcher: Box::new(move |_| {
                let name = watcher_name.clone();
                Box::pin(async move {
                    let url = gen_watch_url("testsuites".to_string(), &name)?;
                    let (stream, _) = connect_async(url.as_str()).await?;
                    let (_, receiver) = stream.split();
                    let events: SuiteEventStream = receiver
                        .filter_map(|msg| async move {
                            match msg {
                                Ok(Message::Text(text)) => Some(
                                    serde_json::from_str::<WatchEvent<TestSuite>>(&text)
                                        .map_err(anyhow::Error::from),
                                ),
                                Ok(Message::Close(_)) => {
                                    Some(Err(anyhow!("api-server watch disconnect")))
                                },
                                Ok(_) => None,
                                Err(e) => Some(Err(anyhow::Error::from(e))),
                            }
                        })
                        .boxed();
                    Ok(events)
                })
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct OpRes {
    msg: String,
    cause: Option<String>,
}

/// Polls the installation resource over the api-server.
pub struct InstallationStatusSource {
    client: Client,
}

#[async_trait]
impl StatusSource for InstallationStatusSource {
    async fn sample(&mut self) -> Result<InstallationStatus, SampleError> {
        let url = gen_url(
            "installations".to_string(),
            Some(&INSTALLATION_NAME.to_string()),
        )?;
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify)?
            .json::<Response<Installation>>()
            .await
            .map_err(classify)?;
        let installation = res
            .data
            .ok_or_else(|| anyhow!("Installation '{}' not found", INSTALLATION_NAME))?;
        Ok(installation.status.unwrap_or_default())
    }

    async fn error_log(&mut self) -> Result<String, SampleError> {
        let status = self.sample().await?;
        Ok(status
            .error_log
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn classify(e: reqwest::Error) -> SampleError {
    if e.is_timeout() {
        SampleError::Timeout(e.to_string())
    } else {
        SampleError::Fatal(e.into())
    }
}
