//! AI-assisted recommendation and comparison.
//!
//! The remote model is treated as an oracle with a hard timeout: it may
//! only choose among reference rows we hand it and its verdict on
//! matching is advisory. `is_matching` and the mismatch list always
//! come from the deterministic comparison; a failed or slow remote
//! call degrades to the local result without failing the request.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Car, Mismatch, OilSpec};
use crate::service::{WorkshopError, WorkshopService, compare};

/// Marker for responses produced without the remote model.
pub const SOURCE_LOCAL: &str = "local";
/// Marker for responses that carry remote-model output.
pub const SOURCE_REMOTE: &str = "openrouter-ai";

/// Remote advisor configuration. An empty API key disables the remote
/// path entirely; everything then runs on the local fallback.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Hard cap on a single remote call.
    pub timeout_secs: u64,
    /// Total attempts; only 429 responses are retried.
    pub max_attempts: u32,
    pub retry_backoff_secs: u64,
    /// Sent as HTTP-Referer, required by the OpenRouter free tier.
    pub referer: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "arcee-ai/trinity-large-preview:free".to_string(),
            timeout_secs: 10,
            max_attempts: 2,
            retry_backoff_secs: 2,
            referer: "http://localhost:8080".to_string(),
        }
    }
}

impl AdvisorConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("remote advisor disabled")]
    Disabled,

    #[error("remote advisor timed out")]
    Timeout,

    #[error("remote advisor request failed: {0}")]
    Http(String),

    #[error("remote advisor returned an unusable response: {0}")]
    BadResponse(String),
}

/// Input for the recommendation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub engine_size: String,
}

/// A chosen recommendation plus the narrative behind it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub oil_type: String,
    pub oil_viscosity: String,
    pub oil_quantity: f64,
    pub reasoning: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub data: Recommendation,
    pub source: &'static str,
}

/// Input for the comparison endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub entered: OilSpec,
    pub recommended: OilSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub is_matching: bool,
    pub mismatches: Vec<Mismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub source: &'static str,
}

/// What the remote model is asked to return for analyze.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRecommendation {
    oil_type: String,
    oil_viscosity: String,
    oil_quantity: f64,
    #[serde(default)]
    reasoning: String,
}

/// What the remote model is asked to return for compare. The verdict
/// fields are parsed but deliberately ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteComparison {
    #[serde(default)]
    analysis: Option<String>,
    #[serde(default)]
    recommendation: Option<String>,
}

/// Thin OpenRouter chat-completions client.
pub struct Advisor {
    http: reqwest::Client,
    config: AdvisorConfig,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// One bounded completion call. Retries once on 429.
    async fn complete(&self, prompt: &str) -> Result<String, AdvisorError> {
        if !self.config.enabled() {
            return Err(AdvisorError::Disabled);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/'),
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.7,
            "max_tokens": 500,
        });

        let mut attempt = 1;
        loop {
            let call = async {
                let resp = self
                    .http
                    .post(&url)
                    .bearer_auth(&self.config.api_key)
                    .header("HTTP-Referer", &self.config.referer)
                    .header("X-Title", "Motorlog")
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AdvisorError::Http(e.to_string()))?;
                let status = resp.status();
                let text = resp
                    .text()
                    .await
                    .map_err(|e| AdvisorError::Http(e.to_string()))?;
                Ok::<_, AdvisorError>((status, text))
            };

            let (status, text) =
                match tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), call)
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => return Err(AdvisorError::Timeout),
                };

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                && attempt < self.config.max_attempts
            {
                tracing::debug!(attempt, "advisor rate limited, backing off");
                tokio::time::sleep(Duration::from_secs(self.config.retry_backoff_secs)).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                return Err(AdvisorError::Http(format!("status {}: {}", status, text)));
            }

            let parsed: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| AdvisorError::BadResponse(e.to_string()))?;
            let content = parsed["choices"][0]["message"]["content"]
                .as_str()
                .ok_or_else(|| AdvisorError::BadResponse("missing message content".into()))?;
            return Ok(content.to_string());
        }
    }

    /// Ask the remote model to pick among the given reference rows.
    async fn analyze_remote(
        &self,
        req: &AnalyzeRequest,
        candidates: &[Car],
    ) -> Result<Recommendation, AdvisorError> {
        let options = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "Option {}: Oil Type: {}, Viscosity: {}, Quantity: {}L (Year Range: {}-{})",
                    i + 1,
                    c.oil_type,
                    c.oil_viscosity,
                    c.oil_quantity,
                    c.year_from,
                    c.year_to,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are a car maintenance expert. You must select the best oil recommendation \
             from the provided database options ONLY. Do not invent or use external knowledge.\n\n\
             Car Info:\nBrand: {}\nModel: {}\nYear: {}\nEngine Size: {}\n\n\
             Available Database Options:\n{}\n\n\
             Task: Select the most appropriate option from the list above for this specific car year.\n\n\
             Respond ONLY with valid JSON in this exact format:\n\
             {{\"oilType\": \"...\", \"oilViscosity\": \"...\", \"oilQuantity\": 0.0, \"reasoning\": \"...\"}}",
            req.brand, req.model, req.year, req.engine_size, options,
        );

        let content = self.complete(&prompt).await?;
        let json = extract_json(&content)
            .ok_or_else(|| AdvisorError::BadResponse("no JSON object in reply".into()))?;
        let remote: RemoteRecommendation =
            serde_json::from_str(json).map_err(|e| AdvisorError::BadResponse(e.to_string()))?;

        // Refuse inventions: the pick must correspond to a candidate.
        let known = candidates.iter().any(|c| {
            c.oil_type.eq_ignore_ascii_case(remote.oil_type.trim())
                && c.oil_viscosity.eq_ignore_ascii_case(remote.oil_viscosity.trim())
        });
        if !known {
            return Err(AdvisorError::BadResponse(
                "model chose a spec outside the candidate list".into(),
            ));
        }

        Ok(Recommendation {
            oil_type: remote.oil_type,
            oil_viscosity: remote.oil_viscosity,
            oil_quantity: remote.oil_quantity,
            reasoning: remote.reasoning,
        })
    }

    /// Ask the remote model for a narrative comparison.
    async fn compare_remote(
        &self,
        req: &CompareRequest,
    ) -> Result<RemoteComparison, AdvisorError> {
        let prompt = format!(
            "You are a car maintenance supervisor. Compare the entered data with the recommended data:\n\n\
             Entered Data:\n- Oil Type: {}\n- Viscosity: {}\n- Quantity: {} liters\n\n\
             Recommended Data:\n- Oil Type: {}\n- Viscosity: {}\n- Quantity: {} liters\n\n\
             Analyze the differences and give your opinion. Respond ONLY with JSON:\n\
             {{\"analysis\": \"brief analysis of why different and if acceptable\", \
             \"recommendation\": \"short advice\"}}",
            req.entered.oil_type,
            req.entered.oil_viscosity,
            req.entered.oil_quantity,
            req.recommended.oil_type,
            req.recommended.oil_viscosity,
            req.recommended.oil_quantity,
        );

        let content = self.complete(&prompt).await?;
        let json = extract_json(&content)
            .ok_or_else(|| AdvisorError::BadResponse("no JSON object in reply".into()))?;
        serde_json::from_str(json).map_err(|e| AdvisorError::BadResponse(e.to_string()))
    }
}

/// First balanced `{...}` block in a model reply, which tends to wrap
/// JSON in prose or code fences.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

impl WorkshopService {
    /// Recommend an oil spec for a car, remote-first with local
    /// fallback. Errors only when no reference row covers the car.
    pub async fn advise_oil(
        &self,
        req: AnalyzeRequest,
    ) -> Result<AnalyzeResponse, WorkshopError> {
        let candidates: Vec<Car> = self
            .candidate_specs(&req.brand, &req.model)?
            .into_iter()
            .filter(|c| {
                c.engine_size.eq_ignore_ascii_case(req.engine_size.trim())
                    && c.year_from <= req.year
                    && req.year <= c.year_to
            })
            .collect();

        if candidates.is_empty() {
            return Err(WorkshopError::NotFound(
                "لا توجد بيانات لهذه السيارة في قاعدة البيانات".into(),
            ));
        }

        match self.advisor.analyze_remote(&req, &candidates).await {
            Ok(data) => Ok(AnalyzeResponse {
                data,
                source: SOURCE_REMOTE,
            }),
            Err(e) => {
                if !matches!(e, AdvisorError::Disabled) {
                    tracing::warn!(error = %e, "advisor analyze failed, using local pick");
                }
                let pick = &candidates[0];
                Ok(AnalyzeResponse {
                    data: Recommendation {
                        oil_type: pick.oil_type.clone(),
                        oil_viscosity: pick.oil_viscosity.clone(),
                        oil_quantity: pick.oil_quantity,
                        reasoning: format!(
                            "Selected from the reference table: year {} falls in {}-{} for {} {}.",
                            req.year, pick.year_from, pick.year_to, pick.brand, pick.model,
                        ),
                    },
                    source: SOURCE_LOCAL,
                })
            }
        }
    }

    /// Compare entered oil facts against a recommendation. The verdict
    /// is always the deterministic check; the remote model only adds
    /// narrative. Never fails on remote trouble.
    pub async fn compare_entry(&self, req: CompareRequest) -> CompareResponse {
        let verdict = compare::check_match(&req.entered, &req.recommended);

        match self.advisor.compare_remote(&req).await {
            Ok(remote) => CompareResponse {
                is_matching: verdict.is_matching,
                mismatches: verdict.mismatches,
                analysis: remote.analysis,
                recommendation: remote.recommendation,
                source: SOURCE_REMOTE,
            },
            Err(e) => {
                if !matches!(e, AdvisorError::Disabled) {
                    tracing::warn!(error = %e, "advisor compare failed, using local verdict");
                }
                CompareResponse {
                    is_matching: verdict.is_matching,
                    mismatches: verdict.mismatches,
                    analysis: None,
                    recommendation: None,
                    source: SOURCE_LOCAL,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateCar;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    #[test]
    fn test_extract_json_plain() {
        let json = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(json, r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let text = "Sure! Here is the result:\n```json\n{\"a\": {\"b\": 2}}\n```\nHope that helps.";
        assert_eq!(extract_json(text), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn test_extract_json_braces_inside_strings() {
        let text = r#"{"analysis": "use {caution}", "recommendation": "ok"}"#;
        assert_eq!(extract_json(text), Some(text));
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_disabled_config() {
        assert!(!AdvisorConfig::default().enabled());
        let enabled = AdvisorConfig {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        assert!(enabled.enabled());
    }

    fn test_service() -> Arc<WorkshopService> {
        test_service_with(AdvisorConfig::default())
    }

    fn test_service_with(config: AdvisorConfig) -> Arc<WorkshopService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = WorkshopService::new(sql, config).unwrap();
        svc.create_car(CreateCar {
            brand: "Toyota".into(),
            model: "Camry".into(),
            year_from: 2012,
            year_to: 2017,
            engine_size: "2.5L".into(),
            oil_type: "Toyota Genuine".into(),
            oil_viscosity: "5W-30".into(),
            oil_quantity: 4.5,
        })
        .unwrap();
        svc.create_car(CreateCar {
            brand: "Toyota".into(),
            model: "Camry".into(),
            year_from: 2018,
            year_to: 2024,
            engine_size: "2.5L".into(),
            oil_type: "Toyota Genuine".into(),
            oil_viscosity: "0W-20".into(),
            oil_quantity: 4.5,
        })
        .unwrap();
        svc
    }

    #[tokio::test]
    async fn test_advise_falls_back_locally_when_disabled() {
        let svc = test_service();

        let resp = svc
            .advise_oil(AnalyzeRequest {
                brand: "Toyota".into(),
                model: "Camry".into(),
                year: 2015,
                engine_size: "2.5L".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.source, SOURCE_LOCAL);
        assert_eq!(resp.data.oil_viscosity, "5W-30");

        let resp = svc
            .advise_oil(AnalyzeRequest {
                brand: "Toyota".into(),
                model: "Camry".into(),
                year: 2020,
                engine_size: "2.5L".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.data.oil_viscosity, "0W-20");
    }

    #[tokio::test]
    async fn test_advise_falls_back_locally_on_timeout() {
        // A server that accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (sock, _) = listener.accept().await.unwrap();
                held.push(sock);
            }
        });

        let svc = test_service_with(AdvisorConfig {
            api_key: "sk-test".into(),
            base_url: format!("http://{addr}"),
            timeout_secs: 1,
            ..Default::default()
        });

        let started = std::time::Instant::now();
        let resp = svc
            .advise_oil(AnalyzeRequest {
                brand: "Toyota".into(),
                model: "Camry".into(),
                year: 2015,
                engine_size: "2.5L".into(),
            })
            .await
            .unwrap();

        assert_eq!(resp.source, SOURCE_LOCAL);
        assert_eq!(resp.data.oil_viscosity, "5W-30");
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_advise_unknown_year_is_not_found() {
        let svc = test_service();
        let result = svc
            .advise_oil(AnalyzeRequest {
                brand: "Toyota".into(),
                model: "Camry".into(),
                year: 2010,
                engine_size: "2.5L".into(),
            })
            .await;
        assert!(matches!(result, Err(WorkshopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_compare_entry_local_verdict() {
        let svc = test_service();
        let resp = svc
            .compare_entry(CompareRequest {
                entered: OilSpec {
                    oil_type: "Castrol".into(),
                    oil_viscosity: "0W-20".into(),
                    oil_quantity: 4.5,
                },
                recommended: OilSpec {
                    oil_type: "Toyota Genuine".into(),
                    oil_viscosity: "0W-20".into(),
                    oil_quantity: 4.5,
                },
            })
            .await;
        assert!(!resp.is_matching);
        assert_eq!(resp.mismatches.len(), 1);
        assert_eq!(resp.source, SOURCE_LOCAL);
        assert!(resp.analysis.is_none());
    }
}
