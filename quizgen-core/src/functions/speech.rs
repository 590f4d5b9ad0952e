use bytes::Bytes;
use kanau::processor::Processor;
use quizgen_sdk::objects::SpeechRequest;

use crate::framework::{FunctionError, FunctionService};

/// Synthesize `text` into WAV audio.
#[derive(Debug, Clone)]
pub struct ConvertToSpeech {
    pub text: String,
}

impl Processor<ConvertToSpeech> for FunctionService {
    type Output = Bytes;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:ConvertToSpeech")]
    async fn process(&self, query: ConvertToSpeech) -> Result<Bytes, FunctionError> {
        let request = self
            .post("convert_to_speech")?
            .json(&SpeechRequest { text: query.text });
        self.call_bytes(request).await
    }
}
