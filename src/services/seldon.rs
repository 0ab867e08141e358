//! Seldon prediction client
//!
//! REST client for a Seldon deployment exposing the v1.0 prediction and
//! feedback APIs. Requests go through an ingress gateway (Istio or
//! Ambassador) or straight to the deployment executor.
//!
//! No retries: a failed call is returned to the caller as-is.

use crate::config::{EndpointConfig, GatewayMode};
use crate::error::{ProbeError, Result};
use crate::types::{FeatureMatrix, FeedbackMessage, Prediction, SeldonMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Prediction endpoint operations used by the feedback driver
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Send one feature matrix for prediction
    ///
    /// Returns the request exactly as sent together with the decoded
    /// response, so both can be handed to [`PredictionClient::feedback`].
    async fn predict(&self, features: &FeatureMatrix) -> Result<Prediction>;

    /// Report a reward for an earlier request/response pair
    async fn feedback(
        &self,
        request: &SeldonMessage,
        response: &SeldonMessage,
        reward: f64,
    ) -> Result<()>;
}

/// REST client for one Seldon deployment
pub struct SeldonClient {
    client: Client,
    base_url: String,
}

impl SeldonClient {
    /// Create a client for the configured deployment
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.timeout).build()?;
        let base_url = Self::base_url(config);

        debug!(
            "Seldon client for deployment '{}' via {} at {}",
            config.deployment_name, config.gateway, base_url
        );

        Ok(Self { client, base_url })
    }

    /// API root for the configured gateway mode
    fn base_url(config: &EndpointConfig) -> String {
        match config.gateway {
            GatewayMode::Istio | GatewayMode::Ambassador => format!(
                "http://{}/seldon/{}/{}/api/v1.0",
                config.gateway_endpoint, config.namespace, config.deployment_name
            ),
            GatewayMode::Direct => format!("http://{}/api/v1.0", config.gateway_endpoint),
        }
    }

    pub fn predictions_url(&self) -> String {
        format!("{}/predictions", self.base_url)
    }

    pub fn feedback_url(&self) -> String {
        format!("{}/feedback", self.base_url)
    }

    /// POST a JSON body and return the raw response text on success
    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<String> {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProbeError::Endpoint {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl PredictionClient for SeldonClient {
    async fn predict(&self, features: &FeatureMatrix) -> Result<Prediction> {
        let request = SeldonMessage::from_features(features);
        let url = self.predictions_url();

        debug!("POST {} ({} feature(s))", url, features.cols());

        let body = self.post_json(&url, &request).await?;
        let response: SeldonMessage = serde_json::from_str(&body).map_err(|e| {
            ProbeError::MalformedResponse(format!(
                "prediction response is not a Seldon message: {}",
                e
            ))
        })?;

        Ok(Prediction { request, response })
    }

    async fn feedback(
        &self,
        request: &SeldonMessage,
        response: &SeldonMessage,
        reward: f64,
    ) -> Result<()> {
        let url = self.feedback_url();
        let message = FeedbackMessage {
            request: request.clone(),
            response: response.clone(),
            reward,
        };

        debug!("POST {} (reward {})", url, reward);

        self.post_json(&url, &message).await?;
        Ok(())
    }
}
