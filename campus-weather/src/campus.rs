use common::errors::AppError;
use common::models::CampusInfo;
use std::fmt;
use std::str::FromStr;

/// The campuses the service knows about.
///
/// Coordinates are fixed; adding a campus means adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Campus {
    Oslo,
    Bergen,
    Trondheim,
    Stavanger,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level
    pub altitude: f64,
}

impl Campus {
    pub const ALL: [Campus; 4] = [
        Campus::Oslo,
        Campus::Bergen,
        Campus::Trondheim,
        Campus::Stavanger,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Campus::Oslo => "Oslo",
            Campus::Bergen => "Bergen",
            Campus::Trondheim => "Trondheim",
            Campus::Stavanger => "Stavanger",
        }
    }

    pub fn coordinates(self) -> Coordinates {
        let (latitude, longitude, altitude) = match self {
            Campus::Oslo => (59.9139, 10.7522, 23.0),
            Campus::Bergen => (60.3913, 5.3221, 12.0),
            Campus::Trondheim => (63.4305, 10.3951, 15.0),
            Campus::Stavanger => (58.9700, 5.7331, 10.0),
        };
        Coordinates {
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn info(self) -> CampusInfo {
        let coords = self.coordinates();
        CampusInfo {
            name: self.name().to_string(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            altitude: coords.altitude,
        }
    }
}

impl fmt::Display for Campus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Campus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Campus::ALL
            .into_iter()
            .find(|campus| campus.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::not_found(format!("Unknown campus '{}'", wanted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oslo_coordinates() {
        let coords = Campus::Oslo.coordinates();
        assert_eq!(coords.latitude, 59.9139);
        assert_eq!(coords.longitude, 10.7522);
        assert_eq!(coords.altitude, 23.0);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("bergen".parse::<Campus>().ok(), Some(Campus::Bergen));
        assert_eq!(" TRONDHEIM ".parse::<Campus>().ok(), Some(Campus::Trondheim));
    }

    #[test]
    fn unknown_campus_is_not_found() {
        let err = "Tromsø".parse::<Campus>().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn names_round_trip() {
        for campus in Campus::ALL {
            assert_eq!(campus.to_string().parse::<Campus>().ok(), Some(campus));
        }
    }
}
