//! Client for the variant-effect prediction endpoint.

use super::{build_client, fetch_json};
use crate::config::Config;
use anyhow::Result;
use helix_core::service::{ClassifyRequest, ServiceResult, VariantPredictor};
use helix_core::AnalysisResult;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub delta_score: f64,
    pub classification_confidence: Option<f64>,
}

impl From<PredictionResponse> for AnalysisResult {
    fn from(response: PredictionResponse) -> Self {
        AnalysisResult {
            prediction: response.prediction,
            score: response.delta_score,
            confidence: response.classification_confidence,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredictorClient {
    client: reqwest::Client,
    url: String,
}

impl PredictorClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            url: url.into(),
        })
    }

    /// `None` when no predictor endpoint is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        config
            .api
            .predictor_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self::new(url, config.api.timeout_secs))
            .transpose()
    }

    pub fn query_params(request: &ClassifyRequest) -> Vec<(&'static str, String)> {
        vec![
            ("variant_position", request.position.to_string()),
            ("alternative", request.alternative.to_string()),
            ("genome", request.genome_id.clone()),
            ("chromosome", request.chromosome.clone()),
        ]
    }
}

impl VariantPredictor for PredictorClient {
    async fn classify(&self, request: &ClassifyRequest) -> ServiceResult<AnalysisResult> {
        log::info!(
            "Classifying {} ({}:{} {}>{})",
            request.clinvar_id,
            request.chromosome,
            request.position,
            request.reference,
            request.alternative
        );
        let http = self.client.post(&self.url).query(&Self::query_params(request));
        let response: PredictionResponse = fetch_json("predictor", http).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_response_mapping() {
        let response: PredictionResponse = serde_json::from_str(
            r#"{"position": 43057062, "reference": "C", "alternative": "A",
                "delta_score": -0.0021, "prediction": "Likely pathogenic",
                "classification_confidence": 0.87}"#,
        )
        .unwrap();
        let result: AnalysisResult = response.into();
        assert_eq!(result.prediction, "Likely pathogenic");
        assert_eq!(result.score, -0.0021);
        assert_eq!(result.confidence, Some(0.87));
    }

    #[test]
    fn test_query_params() {
        let request = ClassifyRequest {
            clinvar_id: "12345".to_string(),
            chromosome: "chr17".to_string(),
            position: 43057062,
            reference: 'C',
            alternative: 'A',
            genome_id: "hg38".to_string(),
        };
        let params = PredictorClient::query_params(&request);
        assert_eq!(params[0], ("variant_position", "43057062".to_string()));
        assert_eq!(params[1], ("alternative", "A".to_string()));
        assert_eq!(params[3], ("chromosome", "chr17".to_string()));
    }

    #[test]
    fn test_from_config_without_url() {
        let config = Config::default();
        assert!(PredictorClient::from_config(&config).unwrap().is_none());
    }
}
