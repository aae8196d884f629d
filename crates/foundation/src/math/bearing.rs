/// Rotation of the rendered world relative to north-up.
///
/// Stored in radians and exchanged in degrees. The value is signed and never
/// wrapped into `[0, 360)`: `from_degrees(370.0).degrees()` is `370.0`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Bearing(f64);

impl Bearing {
    pub const NORTH_UP: Bearing = Bearing(0.0);

    pub fn from_degrees(deg: f64) -> Self {
        Self(deg.to_radians())
    }

    pub fn from_radians(rad: f64) -> Self {
        Self(rad)
    }

    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn is_north_up(self) -> bool {
        self.0 == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::Bearing;

    #[test]
    fn degrees_round_trip() {
        let b = Bearing::from_degrees(45.0);
        assert!((b.radians() - std::f64::consts::FRAC_PI_4).abs() < 1e-15);
        assert!((b.degrees() - 45.0).abs() < 1e-12);
    }

    #[test]
    fn does_not_normalize() {
        assert!((Bearing::from_degrees(370.0).degrees() - 370.0).abs() < 1e-9);
        assert!((Bearing::from_degrees(-725.0).degrees() + 725.0).abs() < 1e-9);
    }

    #[test]
    fn default_is_north_up() {
        assert!(Bearing::default().is_north_up());
        assert!(!Bearing::from_degrees(1.0).is_north_up());
    }
}
