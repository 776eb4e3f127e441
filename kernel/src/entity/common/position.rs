use destructure::Destructure;
use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln, References};

use crate::KernelError;

/// Volumetric mean radius of the Earth.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct Latitude(f64);

impl Latitude {
    pub fn new(latitude: impl Into<f64>) -> Self {
        Self(latitude.into())
    }

    pub fn try_new(latitude: impl Into<f64>) -> error_stack::Result<Self, KernelError> {
        let latitude = latitude.into();
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Report::new(KernelError::Validation)
                .attach_printable(format!("latitude {latitude} is outside of [-90, 90]")));
        }
        Ok(Self(latitude))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct Longitude(f64);

impl Longitude {
    pub fn new(longitude: impl Into<f64>) -> Self {
        Self(longitude.into())
    }

    pub fn try_new(longitude: impl Into<f64>) -> error_stack::Result<Self, KernelError> {
        let longitude = longitude.into();
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Report::new(KernelError::Validation)
                .attach_printable(format!("longitude {longitude} is outside of [-180, 180]")));
        }
        Ok(Self(longitude))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, References, Destructure)]
pub struct Position {
    latitude: Latitude,
    longitude: Longitude,
}

impl Position {
    pub fn new(latitude: Latitude, longitude: Longitude) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Point reached by travelling `distance_km` along the great circle leaving `self` with the
    /// given `bearing` (radians, clockwise from north).
    pub fn destination(&self, distance_km: f64, bearing: f64) -> Self {
        let angular = distance_km / EARTH_RADIUS_KM;
        let lat1 = self.latitude.0.to_radians();
        let lon1 = self.longitude.0.to_radians();

        let lat2 =
            (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        let longitude = (lon2.to_degrees() + 540.0) % 360.0 - 180.0;
        Self::new(Latitude(lat2.to_degrees()), Longitude(longitude))
    }

    /// Great-circle (haversine) distance in kilometers.
    pub fn distance_km(&self, other: &Position) -> f64 {
        let lat1 = self.latitude.0.to_radians();
        let lat2 = other.latitude.0.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude.0 - self.longitude.0).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

#[cfg(test)]
mod test {
    use super::{Latitude, Longitude, Position};
    use crate::KernelError;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Latitude::try_new(51.5).is_ok());
        assert!(Latitude::try_new(-90.0).is_ok());
        let error = Latitude::try_new(90.1).unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Validation);
        assert!(Latitude::try_new(f64::NAN).is_err());

        assert!(Longitude::try_new(-0.16).is_ok());
        assert!(Longitude::try_new(180.0).is_ok());
        assert!(Longitude::try_new(-180.5).is_err());
    }

    #[test]
    fn destination_keeps_requested_distance() {
        let start = Position::new(Latitude::new(51.5), Longitude::new(-0.16));
        for bearing in [0.0, 1.0, 2.5, 4.0, 6.0] {
            let end = start.destination(3.0, bearing);
            assert!((start.distance_km(&end) - 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn destination_wraps_longitude() {
        let start = Position::new(Latitude::new(0.0), Longitude::new(179.99));
        let end = start.destination(5.0, std::f64::consts::FRAC_PI_2);
        let longitude: f64 = (*end.longitude()).into();
        assert!((-180.0..=180.0).contains(&longitude));
        assert!(longitude < 0.0);
    }
}
