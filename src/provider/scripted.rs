//! A provider that replays canned fragments.
//!
//! Records every message list it receives so callers can inspect what was
//! forwarded.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::provider::{ChatProvider, FragmentStream, ProviderError, ProviderMessage};

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    fragments: Vec<String>,
    failure: Option<String>,
    received: Mutex<Vec<Vec<ProviderMessage>>>,
}

impl ScriptedProvider {
    /// Reply with `fragments`; the full reply is their concatenation.
    pub fn replying<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Fail every call with `message` before producing anything.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Stream `fragments`, then fail with `message`. Full replies fail outright.
    pub fn failing_after<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failure: Some(message.into()),
            ..Self::replying(fragments)
        }
    }

    /// Message lists received so far, oldest first.
    pub fn received(&self) -> Vec<Vec<ProviderMessage>> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn record(&self, messages: &[ProviderMessage]) {
        if let Ok(mut received) = self.received.lock() {
            received.push(messages.to_vec());
        }
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn generate(&self, messages: &[ProviderMessage]) -> Result<String, ProviderError> {
        self.record(messages);
        match &self.failure {
            Some(message) => Err(ProviderError::Api(message.clone())),
            None => Ok(self.fragments.concat()),
        }
    }

    fn generate_stream(&self, messages: Vec<ProviderMessage>) -> FragmentStream {
        self.record(&messages);
        let fragments = self.fragments.iter().cloned().map(Ok);
        let failure = self
            .failure
            .clone()
            .map(|message| Err(ProviderError::Api(message)));

        stream::iter(fragments.chain(failure).collect::<Vec<_>>()).boxed()
    }
}
