use anyhow::Result;

use super::EmbeddingService;
use crate::util::sha256_hex;

const MIN_DIMENSIONS: usize = 8;

/// Deterministic hashed bag-of-words embedding, L2 normalized and stable
/// across runs and platforms.
pub struct LocalHashEmbedder {
    dimensions: usize,
    model_id: String,
}

impl LocalHashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(MIN_DIMENSIONS);
        Self {
            dimensions,
            model_id: format!("local-hash-{dimensions}"),
        }
    }
}

impl EmbeddingService for LocalHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0_f32; self.dimensions];

        for feature in token_features(text) {
            let hash = feature_hash(&feature);
            let index = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
            vector[index] += sign * weight;
        }

        normalize(&mut vector);
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn feature_hash(feature: &str) -> u64 {
    let digest = sha256_hex(feature);
    u64::from_str_radix(&digest[..16], 16).unwrap_or_default()
}

// Unigrams plus adjacent-word bigrams over lowercased alphanumeric words.
fn token_features(text: &str) -> Vec<String> {
    let words = text
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|character| character.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<String>>();

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn normalize(values: &mut [f32]) {
    let norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>()
        .sqrt() as f32;

    if norm > 0.0 {
        for value in values {
            *value /= norm;
        }
    }
}
