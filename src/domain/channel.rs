// Channel classification: sensor names to series, chart and scale keys
use std::fmt;

pub const GYRO_CHANNEL: &str = "GYRO";
const MOTOR_PREFIX: &str = "MOTOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GyroMetric {
    AngularVelocity,
    Acceleration,
    ResultantAcceleration,
}

impl GyroMetric {
    pub const ALL: [GyroMetric; 3] = [
        GyroMetric::AngularVelocity,
        GyroMetric::Acceleration,
        GyroMetric::ResultantAcceleration,
    ];
}

/// Result of parsing a sensor name from a data point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// The gyro triad; fans out into one group per axis.
    Gyro,
    /// `MOTOR<digits>_<metric>`
    MotorMetric { motor_id: String, metric: String },
    Unrecognized,
}

impl Channel {
    pub fn parse(name: &str) -> Self {
        if name == GYRO_CHANNEL {
            return Channel::Gyro;
        }

        Self::parse_motor(name).unwrap_or(Channel::Unrecognized)
    }

    fn parse_motor(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(MOTOR_PREFIX)?;
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }

        let metric = rest[digits..].strip_prefix('_')?;
        let metric_ok = !metric.is_empty()
            && metric
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !metric_ok {
            return None;
        }

        Some(Channel::MotorMetric {
            motor_id: name[..MOTOR_PREFIX.len() + digits].to_string(),
            metric: metric.to_string(),
        })
    }
}

/// Identity of one buffered series: (group, subkey, metric).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    Gyro { axis: Axis, metric: GyroMetric },
    Motor { metric: String, motor_id: String },
}

impl SeriesKey {
    pub fn gyro(axis: Axis, metric: GyroMetric) -> Self {
        SeriesKey::Gyro { axis, metric }
    }

    pub fn motor(metric: impl Into<String>, motor_id: impl Into<String>) -> Self {
        SeriesKey::Motor {
            metric: metric.into(),
            motor_id: motor_id.into(),
        }
    }

    /// Chart surface the series is drawn on.
    pub fn chart(&self) -> ChartId {
        match self {
            SeriesKey::Gyro { axis, .. } => ChartId::Gyro(*axis),
            SeriesKey::Motor { metric, .. } => ChartId::Motor(metric.clone()),
        }
    }

    /// Running bounds are shared by every series with the same group and metric.
    pub fn scale(&self) -> ScaleKey {
        match self {
            SeriesKey::Gyro { metric, .. } => ScaleKey::Gyro(*metric),
            SeriesKey::Motor { metric, .. } => ScaleKey::Motor(metric.clone()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            SeriesKey::Gyro { axis, metric } => match metric {
                GyroMetric::AngularVelocity => format!("Gyro Angular Velocity {}", axis.label()),
                GyroMetric::Acceleration => format!("Gyro Acceleration {}", axis.label()),
                GyroMetric::ResultantAcceleration => "Resultant Acceleration".to_string(),
            },
            SeriesKey::Motor { motor_id, .. } => motor_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChartId {
    Gyro(Axis),
    Motor(String),
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartId::Gyro(axis) => write!(f, "GYRO Data - {} Axis", axis.label()),
            ChartId::Motor(metric) => write!(f, "Motor Data - {}", metric),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScaleKey {
    Gyro(GyroMetric),
    Motor(String),
}
