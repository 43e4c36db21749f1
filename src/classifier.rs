pub use candle_core::Device;
use candle_core::{DType, IndexOp, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::{linear, Linear, Module, VarBuilder};
use candle_transformers::models::bert::BertModel;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::model::config::Config;

/// Sequence length every input is padded or truncated to before the
/// forward pass.
pub const MAX_SEQUENCE_LENGTH: usize = 128;

const NUM_LABELS: usize = 2;

#[derive(Debug)]
pub enum Error {
    TokenizerError(tokenizers::Error),
    CandleError(candle_core::Error),
    SerializationError(serde_json::Error),
    IOError(std::io::Error),
}

impl From<tokenizers::Error> for Error {
    fn from(err: tokenizers::Error) -> Self {
        Self::TokenizerError(err)
    }
}

impl From<candle_core::Error> for Error {
    fn from(err: candle_core::Error) -> Self {
        Self::CandleError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::TokenizerError(e) => write!(f, "tokenizer error: {}", e),
            Self::CandleError(e) => write!(f, "candle error: {}", e),
            Self::SerializationError(e) => write!(f, "serialization error: {}", e),
            Self::IOError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// A fine-tuned BERT body with the pooler and two-way linear head from the
/// `BertForSequenceClassification` checkpoint layout.
pub struct BertForAdClassification {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertForAdClassification {
    /// Loads `config.json`, `tokenizer.json` and `model.safetensors` from a
    /// model directory. The tokenizer is configured for fixed-length
    /// padding and truncation so every request sees the same input shape.
    pub fn load<P: AsRef<Path>>(path: P, device: Device) -> Result<Self> {
        let mut dir = PathBuf::from(path.as_ref());

        dir.push("config.json");
        let config_reader = File::open(&dir)?;
        let config: Config = serde_json::from_reader(config_reader)?;
        dir.pop();

        dir.push("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&dir)?;
        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::Fixed(MAX_SEQUENCE_LENGTH),
                pad_id: config.bert_config.pad_token_id as u32,
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))?;
        dir.pop();

        dir.push("model.safetensors");
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&dir], DType::F32, &device) }?;
        dir.pop();

        let bert = BertModel::load(vb.clone(), &config.bert_config)?;
        let hidden_size = config.bert_config.hidden_size;
        let pooler = linear(hidden_size, hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(hidden_size, NUM_LABELS, vb.pp("classifier"))?;

        if !config.head_config.id2label.is_empty() {
            tracing::debug!(labels = ?config.head_config.id2label, "checkpoint label map");
        }

        Ok(Self {
            bert,
            pooler,
            classifier,
            tokenizer,
            device,
        })
    }

    /// Runs one text through the model and returns the softmax distribution
    /// over {Non-Ad, Ad} together with the argmax label.
    pub fn classify(&self, text: &str) -> Result<AnalyzeResponse> {
        let encoding = self.tokenizer.encode(text, true)?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        // [CLS] representation, pooled the way the checkpoint was trained.
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;
        let probabilities: Vec<f32> = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1()?;

        Ok(AnalyzeResponse::from_probabilities(
            text.to_string(),
            probabilities[0],
            probabilities[1],
        ))
    }
}

#[derive(Clone, Copy, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub enum Label {
    #[serde(rename = "Non-Ad")]
    NonAd,
    #[serde(rename = "Ad")]
    Ad,
}

#[derive(Clone, Copy, Deserialize, Serialize, Debug, PartialEq)]
pub struct Confidence {
    #[serde(rename = "Non-Ad")]
    pub non_ad: f32,
    #[serde(rename = "Ad")]
    pub ad: f32,
}

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct AnalyzeResponse {
    pub text: String,
    pub prediction: Label,
    pub confidence: Confidence,
}

impl AnalyzeResponse {
    pub fn from_probabilities(text: String, non_ad: f32, ad: f32) -> Self {
        let prediction = if ad > non_ad { Label::Ad } else { Label::NonAd };
        Self {
            text,
            prediction,
            confidence: Confidence { non_ad, ad },
        }
    }

    /// Fixed response for empty or whitespace-only input. The model is
    /// never consulted and the echoed text is always empty, whatever
    /// whitespace the request carried.
    pub fn empty_default() -> Self {
        Self {
            text: String::new(),
            prediction: Label::NonAd,
            confidence: Confidence {
                non_ad: 1.0,
                ad: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_matches_argmax() {
        let ad = AnalyzeResponse::from_probabilities("buy now".to_string(), 0.03, 0.97);
        assert_eq!(ad.prediction, Label::Ad);

        let non_ad = AnalyzeResponse::from_probabilities("hello".to_string(), 0.8, 0.2);
        assert_eq!(non_ad.prediction, Label::NonAd);
    }

    #[test]
    fn tie_goes_to_non_ad() {
        let tied = AnalyzeResponse::from_probabilities("maybe".to_string(), 0.5, 0.5);
        assert_eq!(tied.prediction, Label::NonAd);
    }

    #[test]
    fn empty_default_is_deterministic() {
        let response = AnalyzeResponse::empty_default();
        assert_eq!(response.text, "");
        assert_eq!(response.prediction, Label::NonAd);
        assert_eq!(response.confidence.non_ad, 1.0);
        assert_eq!(response.confidence.ad, 0.0);
    }

    #[test]
    fn response_serializes_with_label_keys() {
        let response = AnalyzeResponse::from_probabilities("50% off".to_string(), 0.1, 0.9);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["text"], "50% off");
        assert_eq!(json["prediction"], "Ad");
        let confidence = json["confidence"].as_object().unwrap();
        assert!(confidence.contains_key("Non-Ad"));
        assert!(confidence.contains_key("Ad"));
    }

    #[test]
    fn softmax_output_is_a_distribution() {
        let logits = Tensor::new(&[[1.5f32, -0.5]], &Device::Cpu).unwrap();
        let probabilities: Vec<f32> = softmax(&logits, D::Minus1)
            .unwrap()
            .squeeze(0)
            .unwrap()
            .to_vec1()
            .unwrap();
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
