//! Performance purposes and their canonical model names.

use serde::{Deserialize, Serialize};

/// What a performance chart measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    DistanceGroundRoll,
    DistanceToObstacle,
    LandingDistance,
    RateOfClimb,
    BestClimbSpeed,
    FuelFlow,
    Tas,
    Other,
}

/// Purposes a complete take-off/landing model is expected to cover.
pub const EXPECTED_PURPOSES: &[Purpose] = &[
    Purpose::DistanceGroundRoll,
    Purpose::DistanceToObstacle,
    Purpose::LandingDistance,
];

/// Name given to functions whose purpose has no canonical mapping.
pub const UNKNOWN_FUNCTION: &str = "unknown_function";

impl Purpose {
    /// Wire name, e.g. `distance_ground_roll`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DistanceGroundRoll => "distance_ground_roll",
            Self::DistanceToObstacle => "distance_to_obstacle",
            Self::LandingDistance => "landing_distance",
            Self::RateOfClimb => "rate_of_climb",
            Self::BestClimbSpeed => "best_climb_speed",
            Self::FuelFlow => "fuel_flow",
            Self::Tas => "tas",
            Self::Other => "other",
        }
    }

    /// Canonical function name in the compiled model.
    pub fn function_name(self) -> &'static str {
        match self {
            Self::DistanceGroundRoll => "takeoff_ground_roll_m",
            Self::DistanceToObstacle => "takeoff_50ft_m",
            Self::LandingDistance => "landing_distance_m",
            Self::RateOfClimb => "rate_of_climb_fpm",
            Self::BestClimbSpeed => "best_climb_speed_kt",
            Self::Tas => "tas_kt",
            Self::FuelFlow => "fuel_flow_lph",
            Self::Other => UNKNOWN_FUNCTION,
        }
    }

    /// Output unit declared for this purpose.
    pub fn unit(self) -> &'static str {
        match self {
            Self::DistanceGroundRoll | Self::DistanceToObstacle | Self::LandingDistance => "m",
            Self::RateOfClimb => "fpm",
            Self::BestClimbSpeed | Self::Tas => "kt",
            Self::FuelFlow => "L/h",
            Self::Other => "unknown",
        }
    }

    /// Name of the dependent quantity plotted by the chart.
    pub fn output_name(self) -> &'static str {
        match self {
            Self::DistanceGroundRoll | Self::DistanceToObstacle | Self::LandingDistance => {
                "distance"
            }
            Self::RateOfClimb => "rate_of_climb",
            Self::BestClimbSpeed => "speed",
            Self::Tas => "tas",
            Self::FuelFlow => "fuel_flow",
            Self::Other => "value",
        }
    }

    /// Whether the output is a distance (subject to distance plausibility checks).
    pub fn is_distance(self) -> bool {
        self.as_str().contains("distance")
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
