use std::sync::Arc;

use anyhow::Result;
use bls::SignatureBytes;
use prometheus_metrics::Metrics;
use reqwest::{Client, Url};

use crate::types::SigningRequest;

use super::types::{RequestBody, SigningResponse};

#[derive(Clone, Debug)]
pub struct Config {
    pub url: Url,
}

#[derive(Clone)]
pub struct Web3Signer {
    client: Client,
    config: Config,
    metrics: Option<Arc<Metrics>>,
}

impl Web3Signer {
    #[must_use]
    pub const fn new(client: Client, config: Config, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            client,
            config,
            metrics,
        }
    }

    pub async fn sign(&self, request: SigningRequest) -> Result<SignatureBytes> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.web3signer_sign_times.start_timer());

        let SigningRequest {
            public_key,
            signing_root,
            message,
            fork_info,
            ..
        } = request;

        let url = self
            .config
            .url
            .join(&format!("/api/v1/eth2/sign/{public_key:?}"))?;

        let body = RequestBody::new(message, signing_root, fork_info);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<SigningResponse>()
            .await?;

        Ok(response.signature)
    }
}
