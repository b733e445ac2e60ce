//! Keyword classification of digitized figures.
//!
//! Classification is approximate by nature. A misread caption degrades to
//! [`Purpose::Other`] and never fails downstream stages.

use crate::domain::purpose::Purpose;
use crate::ingest::Figure;

/// Maps a figure caption to the performance quantity it plots.
pub trait PurposeClassifier: Send + Sync {
    fn detect_purpose(&self, caption: &str) -> Purpose;
}

/// English and French caption keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPurposeClassifier;

impl PurposeClassifier for KeywordPurposeClassifier {
    fn detect_purpose(&self, caption: &str) -> Purpose {
        let caption = caption.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| caption.contains(w));

        if has(&["takeoff", "take-off", "décollage", "decollage"]) {
            if has(&["ground", "roll", "roulement"]) {
                return Purpose::DistanceGroundRoll;
            }
            return Purpose::DistanceToObstacle;
        }
        if has(&["landing", "atterrissage"]) {
            return Purpose::LandingDistance;
        }
        if has(&["climb", "montée", "montee"]) {
            if has(&["best", "speed", "vitesse"]) {
                return Purpose::BestClimbSpeed;
            }
            return Purpose::RateOfClimb;
        }
        if has(&["fuel", "carburant"]) {
            return Purpose::FuelFlow;
        }
        if has(&["speed", "vitesse"]) {
            return Purpose::Tas;
        }
        Purpose::Other
    }
}

/// Whether `figure` looks like a performance chart: tagged `abac`, or an axis
/// label mentioning altitude, distance or temperature.
pub fn is_performance_chart(figure: &Figure) -> bool {
    if figure.kind.as_deref() == Some("abac") {
        return true;
    }
    let Some(axes) = &figure.axes else {
        return false;
    };
    [&axes.x, &axes.y]
        .into_iter()
        .flatten()
        .filter_map(|axis| axis.label.as_deref())
        .map(str::to_lowercase)
        .any(|label| ["alt", "dist", "temp"].iter().any(|k| label.contains(k)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{AxisLabel, FigureAxes};

    fn figure(kind: Option<&str>, x_label: Option<&str>) -> Figure {
        Figure {
            id: "fig-1".to_string(),
            kind: kind.map(str::to_string),
            caption: None,
            page: None,
            axes: Some(FigureAxes {
                x: x_label.map(|l| AxisLabel {
                    label: Some(l.to_string()),
                    min: None,
                    max: None,
                }),
                y: None,
            }),
            digitized_points: Vec::new(),
        }
    }

    #[test]
    fn test_detect_purpose_keywords() {
        let c = KeywordPurposeClassifier;
        let cases = [
            ("Takeoff ground roll", Purpose::DistanceGroundRoll),
            ("Distance de décollage", Purpose::DistanceToObstacle),
            ("TAKEOFF DISTANCE 50 FT", Purpose::DistanceToObstacle),
            ("Landing distance", Purpose::LandingDistance),
            ("Distance d'atterrissage", Purpose::LandingDistance),
            ("Rate of climb", Purpose::RateOfClimb),
            ("Taux de montée", Purpose::RateOfClimb),
            ("Best climb speed", Purpose::BestClimbSpeed),
            ("Consommation carburant", Purpose::FuelFlow),
            ("Cruise speed", Purpose::Tas),
            ("Weight and balance", Purpose::Other),
            ("", Purpose::Other),
        ];
        for (caption, expected) in cases {
            assert_eq!(c.detect_purpose(caption), expected, "{caption}");
        }
    }

    #[test]
    fn test_performance_chart_heuristic() {
        assert!(is_performance_chart(&figure(Some("abac"), None)));
        assert!(is_performance_chart(&figure(None, Some("Pressure Altitude (ft)"))));
        assert!(is_performance_chart(&figure(Some("chart"), Some("OAT temperature"))));
        assert!(!is_performance_chart(&figure(Some("table"), Some("Arm (in)"))));
        let mut bare = figure(None, None);
        bare.axes = None;
        assert!(!is_performance_chart(&bare));
    }
}
