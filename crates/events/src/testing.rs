//! Scripted provider doubles shared by the engine tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use classpulse_core::delivery::Channel;
use tokio::sync::Mutex;

use crate::delivery::{OutboundMessage, ProviderClient, ProviderError, SendReceipt};

#[derive(Debug, Clone, Copy)]
pub enum Script {
    AlwaysOk,
    AlwaysFail,
    /// Fail the first `n` calls, then succeed.
    FailTimes(usize),
}

pub struct FakeProvider {
    name: &'static str,
    channel: Channel,
    script: Script,
    latency: Option<Duration>,
    calls: Mutex<Vec<(String, OutboundMessage)>>,
}

impl FakeProvider {
    pub fn new(name: &'static str, channel: Channel, script: Script) -> Self {
        Self {
            name,
            channel,
            script,
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn whatsapp(script: Script) -> Arc<Self> {
        Arc::new(Self::new("fake-whatsapp", Channel::Whatsapp, script))
    }

    pub fn sms(script: Script) -> Arc<Self> {
        Arc::new(Self::new("fake-sms", Channel::Sms, script))
    }

    /// Every send sleeps for `latency` first (use with paused tokio time).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn calls(&self) -> Vec<(String, OutboundMessage)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        to: &str,
        message: &OutboundMessage,
    ) -> Result<SendReceipt, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let n = {
            let mut calls = self.calls.lock().await;
            calls.push((to.to_string(), message.clone()));
            calls.len()
        };
        let ok = match self.script {
            Script::AlwaysOk => true,
            Script::AlwaysFail => false,
            Script::FailTimes(times) => n > times,
        };
        if ok {
            Ok(SendReceipt {
                message_id: Some(format!("{}-{n}", self.name)),
            })
        } else {
            Err(ProviderError::Rejected(format!("{} scripted failure", self.name)))
        }
    }
}
