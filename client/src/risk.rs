/// Visual severity of a HORI score. Never stored, always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityTier {
    Safe,
    LowRisk,
    Moderate,
    HighRisk,
}

/// Marker color handed to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerColor {
    Green,
    Yellow,
    Orange,
    Red,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Safe => "safe",
            SeverityTier::LowRisk => "low risk",
            SeverityTier::Moderate => "moderate",
            SeverityTier::HighRisk => "high risk",
        }
    }

    pub fn color(&self) -> MarkerColor {
        match self {
            SeverityTier::Safe => MarkerColor::Green,
            SeverityTier::LowRisk => MarkerColor::Yellow,
            SeverityTier::Moderate => MarkerColor::Orange,
            SeverityTier::HighRisk => MarkerColor::Red,
        }
    }
}

/// Classify a HORI score. Higher is healthier; out-of-range scores go
/// through the same thresholds.
pub fn classify(hori: i32) -> SeverityTier {
    if hori >= 85 {
        SeverityTier::Safe
    } else if hori >= 70 {
        SeverityTier::LowRisk
    } else if hori >= 50 {
        SeverityTier::Moderate
    } else {
        SeverityTier::HighRisk
    }
}
