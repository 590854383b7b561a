use serde::{Deserialize, Serialize};

/// Raw sensor input for one cycle. Any source may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    pub timestamp: f64,
    pub gps: Option<GpsFix>,
    pub imu: Option<ImuSample>,
    pub air_data: Option<AirData>,
    pub magnetic: Option<MagneticFix>,
}

fn default_hdop() -> f64 {
    1.0
}

fn default_quality() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub position: Vec<f64>,
    #[serde(default = "default_hdop")]
    pub hdop: f64,
    pub satellites: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    /// Navigation-frame acceleration [m/s^2]
    pub accel: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirData {
    /// Navigation-frame velocity estimate [m/s]
    pub velocity: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagneticFix {
    /// Map-matched position
    pub position: Vec<f64>,
    /// Measured field [nT]
    pub field: Vec<f64>,
    /// Map field at the matched position [nT]
    pub expected_field: Option<Vec<f64>>,
    #[serde(default = "default_quality")]
    pub match_quality: f64,
}
