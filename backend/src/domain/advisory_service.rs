//! AI advisory: crop and livestock diagnosis plus yield prediction.

use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::ports::{AdvisoryAssistant, AdvisoryAssistantError};
use crate::domain::{
    CompletionPrompt, Diagnosis, Error, Question, YieldPrediction, YieldPredictionRequest,
};

pub const DIAGNOSIS_FAILED_MESSAGE: &str =
    "Sorry, an error occurred while processing your question.";
pub const PREDICTION_FAILED_MESSAGE: &str = "Failed to fetch AI prediction.";

#[derive(Clone)]
pub struct AdvisoryService {
    assistant: Arc<dyn AdvisoryAssistant>,
}

impl AdvisoryService {
    pub fn new(assistant: Arc<dyn AdvisoryAssistant>) -> Self {
        Self { assistant }
    }

    async fn complete(
        &self,
        prompt: &CompletionPrompt,
        failure: &'static str,
    ) -> Result<Option<String>, Error> {
        self.assistant
            .complete(prompt)
            .await
            .map_err(|detail: AdvisoryAssistantError| {
                error!(error = %detail, "completion request failed");
                Error::upstream(failure)
            })
    }

    /// Questions outside agriculture get a fixed refusal without an upstream
    /// call.
    pub async fn diagnose(&self, question: &Question) -> Result<Diagnosis, Error> {
        if !question.is_agricultural() {
            debug!("off-topic question refused");
            return Ok(Diagnosis::off_topic());
        }
        let reply = self
            .complete(&CompletionPrompt::diagnosis(question), DIAGNOSIS_FAILED_MESSAGE)
            .await?;
        Ok(Diagnosis::from_reply(reply))
    }

    pub async fn predict_yield(
        &self,
        request: &YieldPredictionRequest,
    ) -> Result<YieldPrediction, Error> {
        let reply = self
            .complete(&request.prompt(), PREDICTION_FAILED_MESSAGE)
            .await?;
        Ok(YieldPrediction::from_reply(reply))
    }
}
