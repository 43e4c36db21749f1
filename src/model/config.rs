use candle_transformers::models::bert::Config as BertConfig;
use serde::Deserialize;
use std::collections::HashMap;

/// The model directory's `config.json`: the transformer hyperparameters the
/// candle BERT loader consumes, flattened together with the
/// classification-head label maps that config does not carry.
///
/// The two flattened structs must not declare the same field twice; serde's
/// flatten buffer hands each key to the first struct that claims it, so a
/// duplicate would leave the second struct missing the field.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub bert_config: BertConfig,
    #[serde(flatten)]
    pub head_config: HeadConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct HeadConfig {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub label2id: HashMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sequence_classification_config() {
        let raw = r#"{
            "model_type": "bert",
            "vocab_size": 30522,
            "hidden_size": 768,
            "num_hidden_layers": 12,
            "num_attention_heads": 12,
            "intermediate_size": 3072,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "max_position_embeddings": 512,
            "type_vocab_size": 2,
            "initializer_range": 0.02,
            "layer_norm_eps": 1e-12,
            "pad_token_id": 0,
            "id2label": {"0": "Non-Ad", "1": "Ad"},
            "label2id": {"Non-Ad": 0, "Ad": 1}
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.bert_config.hidden_size, 768);
        assert_eq!(config.bert_config.pad_token_id, 0);
        assert_eq!(config.head_config.id2label["1"], "Ad");
        assert_eq!(config.head_config.label2id["Ad"], 1);
    }

    #[test]
    fn label_maps_default_to_empty() {
        let raw = r#"{
            "model_type": "bert",
            "vocab_size": 30522,
            "hidden_size": 768,
            "num_hidden_layers": 12,
            "num_attention_heads": 12,
            "intermediate_size": 3072,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "max_position_embeddings": 512,
            "type_vocab_size": 2,
            "initializer_range": 0.02,
            "layer_norm_eps": 1e-12,
            "pad_token_id": 0
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert!(config.head_config.id2label.is_empty());
    }
}
