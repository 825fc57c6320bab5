use serde::Serialize;

/// 分类标签：0=真实人脸，1=AI生成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Real,
    Fake,
}

impl Label {
    /// 判定规则：严格大于0.5才算Fake，恰好0.5归为Real
    pub fn from_prob_fake(prob_fake: f32) -> Self {
        if prob_fake > 0.5 {
            Label::Fake
        } else {
            Label::Real
        }
    }

    pub fn as_index(self) -> u8 {
        match self {
            Label::Real => 0,
            Label::Fake => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Real => "Real",
            Label::Fake => "Fake",
        }
    }
}

/// 一次分类的完整结果
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub label: Label,
    pub prob_fake: f32,
    pub prob_real: f32,
    pub confidence: f32,
}

impl Prediction {
    pub fn from_prob_fake(prob_fake: f32) -> Self {
        let prob_real = 1.0 - prob_fake;
        Self {
            label: Label::from_prob_fake(prob_fake),
            prob_fake,
            prob_real,
            confidence: prob_fake.max(prob_real),
        }
    }

    /// 转成HTTP响应体，浮点统一保留6位小数
    pub fn to_response(self) -> PredictionResponse {
        PredictionResponse {
            predicted_label: self.label.as_index(),
            predicted_class: self.label.as_str(),
            confidence: round6(self.confidence as f64),
            probabilities: Probabilities {
                real: round6(self.prob_real as f64),
                fake: round6(self.prob_fake as f64),
            },
        }
    }
}

/// POST /predict 的200响应体
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub predicted_label: u8,
    pub predicted_class: &'static str,
    pub confidence: f64,
    pub probabilities: Probabilities,
}

#[derive(Debug, Clone, Serialize)]
pub struct Probabilities {
    #[serde(rename = "Real")]
    pub real: f64,
    #[serde(rename = "Fake")]
    pub fake: f64,
}

/// 保留6位小数
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_boundary_is_real() {
        // 恰好0.5判为Real：只有严格大于才选Fake
        assert_eq!(Label::from_prob_fake(0.5), Label::Real);
        assert_eq!(Label::from_prob_fake(0.500001), Label::Fake);
        assert_eq!(Label::from_prob_fake(0.499999), Label::Real);
        assert_eq!(Label::from_prob_fake(0.0), Label::Real);
        assert_eq!(Label::from_prob_fake(1.0), Label::Fake);
    }

    #[test]
    fn probabilities_sum_to_one() {
        for p in [0.0f32, 0.1, 0.25, 0.5, 0.73, 0.999, 1.0] {
            let prediction = Prediction::from_prob_fake(p);
            assert!((prediction.prob_fake + prediction.prob_real - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn confidence_is_max_probability() {
        for p in [0.0f32, 0.2, 0.5, 0.8, 1.0] {
            let prediction = Prediction::from_prob_fake(p);
            assert_eq!(prediction.confidence, prediction.prob_fake.max(prediction.prob_real));
            assert!((0.5..=1.0).contains(&prediction.confidence));
        }
    }

    #[test]
    fn round6_truncates_to_six_decimals() {
        assert_eq!(round6(0.123_456_789), 0.123_457);
        assert_eq!(round6(0.9999999), 1.0);
        assert_eq!(round6(0.0), 0.0);
    }

    #[test]
    fn response_serializes_with_wire_field_names() {
        let response = Prediction::from_prob_fake(0.75).to_response();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["predicted_label"], 1);
        assert_eq!(json["predicted_class"], "Fake");
        assert_eq!(json["confidence"], 0.75);
        assert_eq!(json["probabilities"]["Real"], 0.25);
        assert_eq!(json["probabilities"]["Fake"], 0.75);
    }
}
