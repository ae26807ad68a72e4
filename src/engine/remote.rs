//! HTTP-backed translation and synthesis engines.
//!
//! `RemoteTranslator` calls a Hugging Face style inference endpoint
//! (`POST {base_url}/models/{model}`) serving an NLLB translation model.
//! `RemoteSynthesizer` calls a Coqui TTS server (`GET {base_url}/api/tts`)
//! and returns the WAV bytes it answers with.
//!
//! Both clients are stateless apart from their connection pool, so inference
//! calls may overlap.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{SynthesisConfig, TranslationConfig};

use super::{DecodingParams, Engine, EngineError, SynthesisEngine, TranslationEngine};

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, EngineError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EngineError::Init(format!("HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// RemoteTranslator
// ---------------------------------------------------------------------------

/// Translation through an inference server.
///
/// The `Authorization: Bearer …` header is attached only when
/// `config.api_key` is a non-empty string.
pub struct RemoteTranslator {
    client: reqwest::Client,
    config: TranslationConfig,
    name: String,
}

impl RemoteTranslator {
    pub fn from_config(config: &TranslationConfig) -> Result<Self, EngineError> {
        if config.base_url.trim().is_empty() {
            return Err(EngineError::Init("translation base_url is empty".into()));
        }
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            config: config.clone(),
            name: format!("remote:{}", config.model),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// JSON body for one translation request.
pub fn translation_request_body(
    text: &str,
    source_tag: &str,
    target_tag: &str,
    decoding: &DecodingParams,
) -> Value {
    serde_json::json!({
        "inputs": text,
        "parameters": {
            "src_lang":       source_tag,
            "tgt_lang":       target_tag,
            "num_beams":      decoding.num_beams,
            "early_stopping": decoding.early_stopping,
            "max_length":     decoding.max_length
        },
        "options": { "wait_for_model": true }
    })
}

/// Pull the translated text out of a server answer.
///
/// Accepts `[{"translation_text": …}]`, a bare object of the same shape, and
/// the `generated_text` key some servers use instead.  Servers report
/// failures as `{"error": …}`.
pub fn parse_translation_response(json: &Value) -> Result<String, EngineError> {
    if let Some(err) = json.get("error") {
        let msg = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(EngineError::Inference(msg));
    }

    let item = match json {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| EngineError::Parse("empty result array".into()))?,
        other => other,
    };

    item.get("translation_text")
        .or_else(|| item.get("generated_text"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| EngineError::Parse(format!("no translation_text in {json}")))
}

impl Engine for RemoteTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_concurrent_inference(&self) -> bool {
        true
    }
}

#[async_trait]
impl TranslationEngine for RemoteTranslator {
    async fn translate(
        &self,
        text: &str,
        source_tag: &str,
        target_tag: &str,
        decoding: &DecodingParams,
    ) -> Result<String, EngineError> {
        let body = translation_request_body(text, source_tag, target_tag, decoding);
        let mut req = self.client.post(self.endpoint()).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        let json: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        // Error bodies carry a message worth surfacing, so parse before
        // looking at the status code.
        let parsed = parse_translation_response(&json);
        if !status.is_success() {
            return Err(match parsed {
                Err(e @ EngineError::Inference(_)) => e,
                _ => EngineError::Request(format!("server answered {status}")),
            });
        }
        parsed
    }
}

// ---------------------------------------------------------------------------
// RemoteSynthesizer
// ---------------------------------------------------------------------------

/// Speech synthesis through a Coqui TTS server.
pub struct RemoteSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
    name: String,
}

impl RemoteSynthesizer {
    pub fn from_config(config: &SynthesisConfig) -> Result<Self, EngineError> {
        if config.base_url.trim().is_empty() {
            return Err(EngineError::Init("synthesis base_url is empty".into()));
        }
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            config: config.clone(),
            name: format!("coqui:{}", config.model),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/tts", self.config.base_url.trim_end_matches('/'))
    }
}

/// Query parameters for one synthesis request.
pub fn synthesis_query<'a>(
    text: &'a str,
    voice_tag: &'a str,
    speaker: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut query = vec![("text", text), ("language_id", voice_tag)];
    if let Some(speaker) = speaker.filter(|s| !s.is_empty()) {
        query.push(("speaker_id", speaker));
    }
    query
}

impl Engine for RemoteSynthesizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_concurrent_inference(&self) -> bool {
        true
    }
}

#[async_trait]
impl SynthesisEngine for RemoteSynthesizer {
    async fn synthesize(&self, text: &str, voice_tag: &str) -> Result<Vec<u8>, EngineError> {
        let query = synthesis_query(text, voice_tag, self.config.speaker.as_deref());

        let response = self
            .client
            .get(self.endpoint())
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_carries_tags_and_decoding_policy() {
        let body = translation_request_body("bonjour", "fra_Latn", "mos_Latn", &DecodingParams::default());

        assert_eq!(body["inputs"], "bonjour");
        assert_eq!(body["parameters"]["src_lang"], "fra_Latn");
        assert_eq!(body["parameters"]["tgt_lang"], "mos_Latn");
        assert_eq!(body["parameters"]["num_beams"], 5);
        assert_eq!(body["parameters"]["early_stopping"], true);
        assert_eq!(body["parameters"]["max_length"], 512);
    }

    #[test]
    fn parses_array_response() {
        let json = json!([{ "translation_text": "  ne y windiga  " }]);
        assert_eq!(parse_translation_response(&json).unwrap(), "ne y windiga");
    }

    #[test]
    fn parses_object_and_generated_text_responses() {
        assert_eq!(
            parse_translation_response(&json!({ "translation_text": "salut" })).unwrap(),
            "salut"
        );
        assert_eq!(
            parse_translation_response(&json!([{ "generated_text": "salut" }])).unwrap(),
            "salut"
        );
    }

    #[test]
    fn server_error_is_inference_failure() {
        let json = json!({ "error": "Model is currently loading" });
        assert_eq!(
            parse_translation_response(&json),
            Err(EngineError::Inference("Model is currently loading".into()))
        );
    }

    #[test]
    fn unexpected_shapes_are_parse_errors() {
        assert!(matches!(parse_translation_response(&json!([])), Err(EngineError::Parse(_))));
        assert!(matches!(
            parse_translation_response(&json!({ "label": "POSITIVE" })),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn synthesis_query_skips_missing_speaker() {
        assert_eq!(
            synthesis_query("bonjour", "fr", None),
            vec![("text", "bonjour"), ("language_id", "fr")]
        );
        assert_eq!(synthesis_query("bonjour", "fr", Some("")).len(), 2);
        assert_eq!(
            synthesis_query("bonjour", "fr", Some("Ana Florence")).last(),
            Some(&("speaker_id", "Ana Florence"))
        );
    }

    #[test]
    fn from_config_builds_and_names_engines() {
        let translator = RemoteTranslator::from_config(&TranslationConfig::default()).unwrap();
        assert_eq!(translator.name(), "remote:mafromedia/yaaba-fr-mo-nllb600M");
        assert!(translator.supports_concurrent_inference());
        assert_eq!(
            translator.endpoint(),
            "https://api-inference.huggingface.co/models/mafromedia/yaaba-fr-mo-nllb600M"
        );

        let synth = RemoteSynthesizer::from_config(&SynthesisConfig {
            base_url: "http://localhost:5002/".into(),
            ..SynthesisConfig::default()
        })
        .unwrap();
        assert_eq!(synth.endpoint(), "http://localhost:5002/api/tts");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = TranslationConfig {
            base_url: "  ".into(),
            ..TranslationConfig::default()
        };
        assert!(matches!(
            RemoteTranslator::from_config(&config),
            Err(EngineError::Init(_))
        ));
    }

    #[test]
    fn engines_are_object_safe() {
        let t: Box<dyn TranslationEngine> =
            Box::new(RemoteTranslator::from_config(&TranslationConfig::default()).unwrap());
        let s: Box<dyn SynthesisEngine> =
            Box::new(RemoteSynthesizer::from_config(&SynthesisConfig::default()).unwrap());
        drop((t, s));
    }
}
