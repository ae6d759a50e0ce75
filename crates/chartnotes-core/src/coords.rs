#![forbid(unsafe_code)]

//! Host coordinate conversion.

/// Conversions supplied by the chart host.
///
/// Forward conversions return `None` when the input lies outside the visible
/// domain. Callers propagate `None` as "not displayable this frame" and never
/// substitute a default.
pub trait ChartCoordinates {
    /// Horizontal pixel for a time anchor.
    fn time_to_x(&self, time: f64) -> Option<f64>;

    /// Vertical pixel for a value anchor.
    fn value_to_y(&self, value: f64) -> Option<f64>;

    /// Inverse of [`time_to_x`](Self::time_to_x). Only consulted when drags
    /// are committed back to data coordinates.
    fn x_to_time(&self, x: f64) -> Option<f64> {
        let _ = x;
        None
    }

    /// Inverse of [`value_to_y`](Self::value_to_y).
    fn y_to_value(&self, y: f64) -> Option<f64> {
        let _ = y;
        None
    }
}

impl<T: ChartCoordinates + ?Sized> ChartCoordinates for &T {
    fn time_to_x(&self, time: f64) -> Option<f64> {
        (**self).time_to_x(time)
    }

    fn value_to_y(&self, value: f64) -> Option<f64> {
        (**self).value_to_y(value)
    }

    fn x_to_time(&self, x: f64) -> Option<f64> {
        (**self).x_to_time(x)
    }

    fn y_to_value(&self, y: f64) -> Option<f64> {
        (**self).y_to_value(y)
    }
}

/// Affine mapping over a visible window; handy for tests and headless hosts.
///
/// `x = (time - time_origin) * px_per_time`, `y = y_origin - value * px_per_value`.
/// Anchors outside `[time_min, time_max]` or `[value_min, value_max]` map to `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCoordinates {
    pub time_origin: f64,
    pub px_per_time: f64,
    pub y_origin: f64,
    pub px_per_value: f64,
    pub time_range: (f64, f64),
    pub value_range: (f64, f64),
}

impl LinearCoordinates {
    /// Identity-like mapping with unbounded visible ranges.
    #[must_use]
    pub const fn unbounded(px_per_time: f64, px_per_value: f64, y_origin: f64) -> Self {
        Self {
            time_origin: 0.0,
            px_per_time,
            y_origin,
            px_per_value,
            time_range: (f64::NEG_INFINITY, f64::INFINITY),
            value_range: (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    #[must_use]
    pub const fn with_time_range(mut self, min: f64, max: f64) -> Self {
        self.time_range = (min, max);
        self
    }

    #[must_use]
    pub const fn with_value_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = (min, max);
        self
    }
}

impl ChartCoordinates for LinearCoordinates {
    fn time_to_x(&self, time: f64) -> Option<f64> {
        let (min, max) = self.time_range;
        (time >= min && time <= max).then(|| (time - self.time_origin) * self.px_per_time)
    }

    fn value_to_y(&self, value: f64) -> Option<f64> {
        let (min, max) = self.value_range;
        (value >= min && value <= max).then(|| self.y_origin - value * self.px_per_value)
    }

    fn x_to_time(&self, x: f64) -> Option<f64> {
        if self.px_per_time == 0.0 {
            return None;
        }
        let time = x / self.px_per_time + self.time_origin;
        let (min, max) = self.time_range;
        (time >= min && time <= max).then_some(time)
    }

    fn y_to_value(&self, y: f64) -> Option<f64> {
        if self.px_per_value == 0.0 {
            return None;
        }
        let value = (self.y_origin - y) / self.px_per_value;
        let (min, max) = self.value_range;
        (value >= min && value <= max).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_maps_to_none() {
        let coords = LinearCoordinates::unbounded(2.0, 1.0, 200.0).with_time_range(0.0, 100.0);
        assert_eq!(coords.time_to_x(50.0), Some(100.0));
        assert_eq!(coords.time_to_x(150.0), None);
        assert_eq!(coords.value_to_y(20.0), Some(180.0));
    }

    #[test]
    fn inverse_round_trips_inside_range() {
        let coords = LinearCoordinates::unbounded(2.0, 0.5, 300.0);
        let x = coords.time_to_x(42.0).expect("in range");
        let y = coords.value_to_y(64.0).expect("in range");
        assert_eq!(coords.x_to_time(x), Some(42.0));
        assert_eq!(coords.y_to_value(y), Some(64.0));
    }
}
