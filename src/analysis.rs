//! Site photo analysis.
//!
//! The analysis itself is done by an external vision model. This module owns the
//! request we send it, the report we expect back and, most importantly, what happens
//! when that round trip fails: the caller always gets a report to show, and a failed
//! call is replaced with a clearly labelled demo report.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, error, warn};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::env;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";
pub const DEFAULT_PROMPT: &str = "Analise esta foto do canteiro de obras. Identifique riscos de \
    segurança, estime a fase da obra (ex: fundação, estrutura, acabamento) e conte o número de \
    trabalhadores visíveis se houver. Forneça a resposta em formato JSON estruturado com as \
    chaves: 'safetyHazards' (array de strings), 'phase' (string), 'workerCount' (number), e \
    'summary' (string em português).";

/// Settings for the analysis service
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub prompt: String,
}

/// A single image analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub model: String,
    pub mime_type: String,
    pub data: String, // Base64 encoded image
    pub prompt: String,
}

/// The report returned by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysis {
    pub phase: String,
    #[serde(deserialize_with = "worker_count")]
    pub worker_count: u32,
    pub safety_hazards: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Live(SiteAnalysis),
    Fallback { report: SiteAnalysis, reason: String },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no API key has been configured")]
    MissingApiKey,
    #[error("the analysis service could not be reached: {0}")]
    Transport(String),
    #[error("the analysis response is not a valid report")]
    Parse(#[from] serde_json::Error),
    #[error("the image is not a base64 data URL")]
    InvalidImage,
}

/// A transport for the analysis service.
///
/// Implementations send the request to the vision model, authenticated with the
/// configured API key, and return the raw JSON text of its answer.
pub trait ImageAnalyzer {
    fn analyze(&self, api_key: &str, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            prompt: DEFAULT_PROMPT.to_owned(),
        }
    }
}

impl AnalysisConfig {
    /// Reads `API_KEY`, `ANALYSIS_MODEL` and `ANALYSIS_PROMPT` from the environment,
    /// falling back to the defaults for anything unset or empty.
    pub fn from_env() -> Self {
        let var = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = AnalysisConfig::default();

        AnalysisConfig {
            api_key: var("API_KEY"),
            model: var("ANALYSIS_MODEL").unwrap_or(defaults.model),
            prompt: var("ANALYSIS_PROMPT").unwrap_or(defaults.prompt),
        }
    }

    pub fn with_api_key<S: Into<String>>(&mut self, key: S) -> &mut Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model<S: Into<String>>(&mut self, model: S) -> &mut Self {
        self.model = model.into();
        self
    }

    pub fn with_prompt<S: Into<String>>(&mut self, prompt: S) -> &mut Self {
        self.prompt = prompt.into();
        self
    }
}

impl AnalysisRequest {
    pub fn from_image_bytes(config: &AnalysisConfig, image: &[u8]) -> Self {
        AnalysisRequest {
            model: config.model.clone(),
            mime_type: DEFAULT_MIME_TYPE.to_owned(),
            data: STANDARD.encode(image),
            prompt: config.prompt.clone(),
        }
    }

    /// Builds a request from a browser data URL, e.g. `data:image/png;base64,iVBO...`.
    pub fn from_data_url(config: &AnalysisConfig, url: &str) -> Result<Self, AnalysisError> {
        let (header, data) = url.split_once(',').ok_or(AnalysisError::InvalidImage)?;
        let mime_type = header
            .strip_prefix("data:")
            .and_then(|h| h.strip_suffix(";base64"))
            .ok_or(AnalysisError::InvalidImage)?;

        // Reject anything the service won't be able to decode
        STANDARD
            .decode(data)
            .map_err(|_| AnalysisError::InvalidImage)?;

        Ok(AnalysisRequest {
            model: config.model.clone(),
            mime_type: if mime_type.is_empty() {
                DEFAULT_MIME_TYPE.to_owned()
            } else {
                mime_type.to_owned()
            },
            data: data.to_owned(),
            prompt: config.prompt.clone(),
        })
    }

    /// Overrides the configured prompt for this request only
    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = prompt.into();
        self
    }
}

impl SiteAnalysis {
    /// The report shown when the analysis service is unavailable
    pub fn demo() -> Self {
        SiteAnalysis {
            phase: "Estrutural / Alvenaria".into(),
            worker_count: 4,
            safety_hazards: vec![
                "Operário sem capacete na zona sul".into(),
                "Entulho acumulado próximo à passagem".into(),
            ],
            summary: "A obra está avançando conforme o esperado para a fase estrutural. \
                Recomenda-se atenção imediata ao uso de EPIs."
                .into(),
        }
    }
}

impl AnalysisOutcome {
    pub fn report(&self) -> &SiteAnalysis {
        match self {
            AnalysisOutcome::Live(report) => report,
            AnalysisOutcome::Fallback { report, .. } => report,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisOutcome::Fallback { .. })
    }
}

/// Sends a request to the analysis service and parses its report.
///
/// This never fails. If no API key is configured, the transport fails or the answer
/// can't be parsed, the demo report is returned as a `Fallback` along with the reason.
pub fn analyze_site_photo<A: ImageAnalyzer + ?Sized>(
    config: &AnalysisConfig,
    analyzer: &A,
    request: &AnalysisRequest,
) -> AnalysisOutcome {
    match try_analyze(config, analyzer, request) {
        Ok(report) => {
            debug!(
                "site analysis: phase '{}', {} workers, {} hazards",
                report.phase,
                report.worker_count,
                report.safety_hazards.len()
            );
            AnalysisOutcome::Live(report)
        }
        Err(e) => {
            match e {
                AnalysisError::MissingApiKey => warn!("site analysis skipped: {}", e),
                _ => error!("site analysis failed: {}", e),
            }

            AnalysisOutcome::Fallback {
                report: SiteAnalysis::demo(),
                reason: e.to_string(),
            }
        }
    }
}

fn try_analyze<A: ImageAnalyzer + ?Sized>(
    config: &AnalysisConfig,
    analyzer: &A,
    request: &AnalysisRequest,
) -> Result<SiteAnalysis, AnalysisError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or(AnalysisError::MissingApiKey)?;

    debug!("requesting analysis from {} ({})", request.model, request.mime_type);

    let text = analyzer.analyze(api_key, request)?;
    Ok(serde_json::from_str(&text)?)
}

// The model reports `workerCount` as a JSON number, which may come back as `3.0`
// rather than `3`. Fractional counts are rounded.
fn worker_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let count = f64::deserialize(deserializer)?;

    if !count.is_finite() || count < 0.0 || count > u32::MAX as f64 {
        return Err(de::Error::custom(format!("invalid worker count {}", count)));
    }

    Ok(count.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct Canned {
        response: Result<&'static str, &'static str>,
        calls: Cell<usize>,
        api_key: RefCell<Option<String>>,
    }

    impl Canned {
        fn new(response: Result<&'static str, &'static str>) -> Self {
            Canned {
                response,
                calls: Cell::new(0),
                api_key: RefCell::new(None),
            }
        }
    }

    impl ImageAnalyzer for Canned {
        fn analyze(&self, api_key: &str, _: &AnalysisRequest) -> Result<String, AnalysisError> {
            self.calls.set(self.calls.get() + 1);
            *self.api_key.borrow_mut() = Some(api_key.to_owned());
            self.response
                .map(String::from)
                .map_err(|e| AnalysisError::Transport(e.into()))
        }
    }

    fn config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.with_api_key("test-key");
        config
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::from_image_bytes(&config(), b"\xff\xd8\xff")
    }

    #[test]
    fn live_report() {
        let _ = env_logger::builder().is_test(true).try_init();
        let analyzer = Canned::new(Ok(r#"{
            "phase": "Fundação",
            "workerCount": 7,
            "safetyHazards": ["Vala sem escoramento"],
            "summary": "Escavação em andamento."
        }"#));

        let outcome = analyze_site_photo(&config(), &analyzer, &request());

        assert_eq!(
            outcome,
            AnalysisOutcome::Live(SiteAnalysis {
                phase: "Fundação".into(),
                worker_count: 7,
                safety_hazards: vec!["Vala sem escoramento".into()],
                summary: "Escavação em andamento.".into(),
            })
        );
        assert!(!outcome.is_fallback());
        assert_eq!(analyzer.api_key.borrow().as_deref(), Some("test-key"));
    }

    #[test]
    fn live_report_with_float_worker_count() {
        let analyzer = Canned::new(Ok(
            r#"{"phase":"Fundação","workerCount":3.0,"safetyHazards":[],"summary":"ok"}"#,
        ));
        let outcome = analyze_site_photo(&config(), &analyzer, &request());

        assert!(!outcome.is_fallback());
        assert_eq!(outcome.report().worker_count, 3);
    }

    #[test]
    fn negative_worker_count_falls_back() {
        let analyzer = Canned::new(Ok(
            r#"{"phase":"Fundação","workerCount":-2,"safetyHazards":[],"summary":"ok"}"#,
        ));
        let outcome = analyze_site_photo(&config(), &analyzer, &request());

        assert!(outcome.is_fallback());
    }

    #[test]
    fn missing_key_skips_the_call() {
        let analyzer = Canned::new(Ok("{}"));
        let outcome = analyze_site_photo(&AnalysisConfig::default(), &analyzer, &request());

        assert!(outcome.is_fallback());
        assert_eq!(outcome.report(), &SiteAnalysis::demo());
        assert_eq!(analyzer.calls.get(), 0);
    }

    #[test]
    fn transport_failure_falls_back() {
        let _ = env_logger::builder().is_test(true).try_init();
        let analyzer = Canned::new(Err("connection reset"));
        let outcome = analyze_site_photo(&config(), &analyzer, &request());

        assert_eq!(
            outcome,
            AnalysisOutcome::Fallback {
                report: SiteAnalysis::demo(),
                reason: "the analysis service could not be reached: connection reset".into(),
            }
        );
    }

    #[test]
    fn malformed_response_falls_back() {
        let analyzer = Canned::new(Ok(r#"{"phase":"Acabamento","summary":"ok"}"#));
        let outcome = analyze_site_photo(&config(), &analyzer, &request());

        assert!(outcome.is_fallback());
        assert_eq!(outcome.report(), &SiteAnalysis::demo());
        assert_eq!(analyzer.calls.get(), 1);
    }

    #[test]
    fn request_from_bytes() {
        let request = request();
        assert_eq!(request.data, "/9j/");
        assert_eq!(request.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn request_from_data_url() {
        let request =
            AnalysisRequest::from_data_url(&config(), "data:image/png;base64,/9j/").unwrap();
        assert_eq!(request.mime_type, "image/png");
        assert_eq!(request.data, "/9j/");

        let request = request.with_prompt("Conte os trabalhadores");
        assert_eq!(request.prompt, "Conte os trabalhadores");
    }

    #[test]
    fn request_from_invalid_data_url() {
        assert!(matches!(
            AnalysisRequest::from_data_url(&config(), "/9j/"),
            Err(AnalysisError::InvalidImage)
        ));
        assert!(matches!(
            AnalysisRequest::from_data_url(&config(), "data:image/png,/9j/"),
            Err(AnalysisError::InvalidImage)
        ));
        assert!(matches!(
            AnalysisRequest::from_data_url(&config(), "data:image/png;base64,not base64!"),
            Err(AnalysisError::InvalidImage)
        ));
    }

    #[test]
    fn config_builders() {
        let mut config = AnalysisConfig::default();
        config.with_model("vision-2").with_prompt("Descreva a obra");

        assert_eq!(config.api_key, None);
        assert_eq!(config.model, "vision-2");
        assert_eq!(config.prompt, "Descreva a obra");
    }
}
