use serde::Serialize;

/// Normative reading of a prediction: the 1-5 scale splits into a
/// prohibition block, an unclear middle where no norm is generated, and a
/// permission block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormClass {
    Prohibition,
    Unclear,
    Permission,
}

impl NormClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormClass::Prohibition => "prohibition",
            NormClass::Unclear => "unclear",
            NormClass::Permission => "permission",
        }
    }
}

/// Map a (prediction, confidence) pair to its norm class.
///
/// Higher confidence widens the outer blocks: the unclear band is the
/// open interval (2 + confidence, 4 - confidence), permission anything
/// above its upper bound, prohibition everything else. The permission
/// check runs last and overrides; at confidence 1 the unclear band
/// vanishes entirely. The threshold arithmetic is exact, not rounded.
pub fn classify(prediction: f64, confidence: f64) -> NormClass {
    let mut class = NormClass::Prohibition;
    if prediction > 2.0 + confidence && prediction < 4.0 - confidence {
        class = NormClass::Unclear;
    }
    if prediction > 4.0 - confidence {
        class = NormClass::Permission;
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_the_scale_at_half_confidence() {
        assert_eq!(classify(3.0, 0.5), NormClass::Unclear);
        assert_eq!(classify(3.6, 0.5), NormClass::Permission);
        assert_eq!(classify(2.0, 0.5), NormClass::Prohibition);
    }

    #[test]
    fn band_boundaries_fall_back_to_prohibition() {
        // Both bounds are strict, so exact hits classify as prohibition.
        assert_eq!(classify(2.5, 0.5), NormClass::Prohibition);
        assert_eq!(classify(3.5, 0.5), NormClass::Prohibition);
    }

    #[test]
    fn full_confidence_leaves_no_unclear_band() {
        assert_eq!(classify(3.0, 1.0), NormClass::Prohibition);
        assert_eq!(classify(3.1, 1.0), NormClass::Permission);
    }

    #[test]
    fn zero_confidence_uses_the_bare_thresholds() {
        assert_eq!(classify(2.1, 0.0), NormClass::Unclear);
        assert_eq!(classify(4.1, 0.0), NormClass::Permission);
        assert_eq!(classify(1.9, 0.0), NormClass::Prohibition);
    }

    #[test]
    fn negative_confidence_widens_the_unclear_band() {
        // Confidence below zero stretches the band to (1.5, 4.5).
        assert_eq!(classify(1.8, -0.5), NormClass::Unclear);
        assert_eq!(classify(4.4, -0.5), NormClass::Unclear);
        assert_eq!(classify(4.6, -0.5), NormClass::Permission);
    }
}
