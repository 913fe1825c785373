//! Simulated physiological readings
//!
//! Each metric ramps by one unit per step and turns around at its profile
//! bounds, producing a triangle wave. Every metric has an independent ramp
//! per unit system.

use crate::config::metrics::*;

/// Reading being simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Systolic,
    Diastolic,
    MeanArterialPressure,
    PulseRate,
    /// Cuff pressure reported while a measurement is in progress.
    /// Shares the systolic bounds but ramps on its own.
    InterimSystolic,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Systolic,
        Metric::Diastolic,
        Metric::MeanArterialPressure,
        Metric::PulseRate,
        Metric::InterimSystolic,
    ];

    fn index(self) -> usize {
        match self {
            Metric::Systolic => 0,
            Metric::Diastolic => 1,
            Metric::MeanArterialPressure => 2,
            Metric::PulseRate => 3,
            Metric::InterimSystolic => 4,
        }
    }
}

/// Pressure unit system of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    MillimetresOfMercury,
    Kilopascal,
}

impl UnitSystem {
    pub const ALL: [UnitSystem; 2] = [UnitSystem::MillimetresOfMercury, UnitSystem::Kilopascal];

    /// The other unit system
    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::MillimetresOfMercury => UnitSystem::Kilopascal,
            UnitSystem::Kilopascal => UnitSystem::MillimetresOfMercury,
        }
    }

    /// Short label for log output
    pub fn label(self) -> &'static str {
        match self {
            UnitSystem::MillimetresOfMercury => "mmHg",
            UnitSystem::Kilopascal => "kPa",
        }
    }

    fn index(self) -> usize {
        match self {
            UnitSystem::MillimetresOfMercury => 0,
            UnitSystem::Kilopascal => 1,
        }
    }
}

impl Default for UnitSystem {
    /// The first user request with indications enabled toggles to mmHg.
    fn default() -> Self {
        UnitSystem::Kilopascal
    }
}

/// Inclusive range a metric oscillates within
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u16,
    pub max: u16,
}

/// Profile bounds for a metric in a unit system
pub fn bounds(metric: Metric, unit: UnitSystem) -> Bounds {
    use UnitSystem::*;

    let (min, max) = match (metric, unit) {
        (Metric::Systolic | Metric::InterimSystolic, MillimetresOfMercury) => {
            (SYSTOLIC_MIN_MMHG, SYSTOLIC_MAX_MMHG)
        }
        (Metric::Systolic | Metric::InterimSystolic, Kilopascal) => {
            (SYSTOLIC_MIN_KPA, SYSTOLIC_MAX_KPA)
        }
        (Metric::Diastolic, MillimetresOfMercury) => (DIASTOLIC_MIN_MMHG, DIASTOLIC_MAX_MMHG),
        (Metric::Diastolic, Kilopascal) => (DIASTOLIC_MIN_KPA, DIASTOLIC_MAX_KPA),
        (Metric::MeanArterialPressure, MillimetresOfMercury) => (MAP_MIN_MMHG, MAP_MAX_MMHG),
        (Metric::MeanArterialPressure, Kilopascal) => (MAP_MIN_KPA, MAP_MAX_KPA),
        (Metric::PulseRate, _) => (PULSE_RATE_MIN, PULSE_RATE_MAX),
    };

    Bounds { min, max }
}

/// Ramp state of one metric/unit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ramp {
    value: u16,
    rising: bool,
}

impl Ramp {
    fn at_min(bounds: Bounds) -> Self {
        Self {
            value: bounds.min,
            rising: true,
        }
    }

    fn step(&mut self, bounds: Bounds) -> u16 {
        self.value = if self.rising {
            self.value.saturating_add(1)
        } else {
            self.value.saturating_sub(1)
        };

        if self.value >= bounds.max {
            self.rising = false;
        } else if self.value <= bounds.min {
            self.rising = true;
        }

        self.value
    }
}

const METRIC_COUNT: usize = Metric::ALL.len();
const UNIT_COUNT: usize = UnitSystem::ALL.len();

/// Current value and direction for every metric/unit pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oscillator {
    ramps: [[Ramp; UNIT_COUNT]; METRIC_COUNT],
}

impl Oscillator {
    /// All metrics at their minima, rising
    pub fn new() -> Self {
        let mut ramps = [[Ramp { value: 0, rising: true }; UNIT_COUNT]; METRIC_COUNT];
        for metric in Metric::ALL {
            for unit in UnitSystem::ALL {
                ramps[metric.index()][unit.index()] = Ramp::at_min(bounds(metric, unit));
            }
        }
        Self { ramps }
    }

    /// Current value without advancing
    pub fn value(&self, metric: Metric, unit: UnitSystem) -> u16 {
        self.ramps[metric.index()][unit.index()].value
    }

    /// Current direction: +1 rising, -1 falling
    pub fn direction(&self, metric: Metric, unit: UnitSystem) -> i8 {
        if self.ramps[metric.index()][unit.index()].rising {
            1
        } else {
            -1
        }
    }

    /// Step the metric by one unit and return the new value.
    pub fn advance(&mut self, metric: Metric, unit: UnitSystem) -> u16 {
        self.ramps[metric.index()][unit.index()].step(bounds(metric, unit))
    }

    /// Put every metric back to its minimum.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}
