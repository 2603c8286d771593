//! Shopper feedback

use crate::models::Ack;
use api_client::descriptor::{MockEnv, RequestDescriptor};
use api_client::{ApiError, ApiRequest, RawResponse, Result};
use serde::{Deserialize, Serialize};

/// Longest message accepted
pub const MAX_MESSAGE_LEN: usize = 1000;

/// A rating with a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    /// Stars, 1 to 5
    pub rating: u8,
    /// Free text
    pub message: String,
    /// Order the feedback is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// `POST /feedback`
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitFeedback;

impl RequestDescriptor for SubmitFeedback {
    type Input = FeedbackInput;
    type Output = Ack;
    const NAME: &'static str = "feedback.submit";

    fn validate(&self, input: &FeedbackInput) -> Result<()> {
        if !(1..=5).contains(&input.rating) {
            return Err(ApiError::validation("Rating must be between 1 and 5"));
        }
        let message = input.message.trim();
        if message.is_empty() {
            return Err(ApiError::validation("Please tell us a little more"));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ApiError::validation(format!(
                "Feedback must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        Ok(())
    }

    fn mock(&self, _input: &FeedbackInput, _env: &MockEnv) -> Result<Ack> {
        Ok(Ack::new("Thank you for your feedback!"))
    }

    fn request(&self, input: &FeedbackInput) -> Result<ApiRequest> {
        ApiRequest::post("/feedback").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> Result<Ack> {
        Ack::from_response(response, "Thank you for your feedback!")
    }
}
