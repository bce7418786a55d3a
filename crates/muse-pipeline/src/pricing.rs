//! Static per-call cost estimates
//!
//! Consulted only for preview/confirmation display, never for billing
//! enforcement. Unknown models estimate at 0.0.

/// Flat per-call cost estimates by provider model id, in USD.
const MODEL_PRICES: &[(&str, f64)] = &[
    ("fal-ai/flux/dev", 0.025),
    ("fal-ai/flux/schnell", 0.003),
    ("fal-ai/flux-pro/v1.1", 0.05),
    ("fal-ai/recraft/v3/text-to-image", 0.04),
    ("fal-ai/stable-audio", 0.06),
    ("elevenlabs/sound-effects", 0.08),
    ("fal-ai/kling-video/v1.6/standard/text-to-video", 0.45),
    ("fal-ai/veo2", 1.25),
    ("meshy/text-to-3d", 0.20),
];

/// Lookup table for per-model cost estimates
#[derive(Debug, Clone, Default)]
pub struct PriceTable;

impl PriceTable {
    pub fn new() -> Self {
        Self
    }

    /// Estimated cost of one call against the given model, 0.0 if unknown
    pub fn estimate(&self, provider_model: &str) -> f64 {
        MODEL_PRICES
            .iter()
            .find(|(id, _)| *id == provider_model)
            .map(|(_, cost)| *cost)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_price() {
        let table = PriceTable::new();
        assert_eq!(table.estimate("fal-ai/flux/dev"), 0.025);
        assert_eq!(table.estimate("meshy/text-to-3d"), 0.20);
    }

    #[test]
    fn test_unknown_model_is_free_estimate() {
        let table = PriceTable::new();
        assert_eq!(table.estimate("somebody/brand-new-model"), 0.0);
        assert_eq!(table.estimate(""), 0.0);
    }
}
