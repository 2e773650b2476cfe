use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::LazyLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }

    pub const fn all() -> &'static [Season] {
        &[Season::Winter, Season::Spring, Season::Summer, Season::Autumn]
    }

    pub fn of_date(date: NaiveDate) -> Season {
        // chrono guarantees month() is in 1..=12
        match date.month() {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Long-run mean temperature (°C) per season for one city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalNormals {
    pub winter: f64,
    pub spring: f64,
    pub summer: f64,
    pub autumn: f64,
}

impl SeasonalNormals {
    const fn new(winter: f64, spring: f64, summer: f64, autumn: f64) -> Self {
        Self { winter, spring, summer, autumn }
    }

    pub fn mean_for(&self, season: Season) -> f64 {
        match season {
            Season::Winter => self.winter,
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
        }
    }
}

const NORMALS_TABLE: &[(&str, SeasonalNormals)] = &[
    ("New York", SeasonalNormals::new(0.0, 10.0, 25.0, 15.0)),
    ("London", SeasonalNormals::new(5.0, 11.0, 18.0, 12.0)),
    ("Paris", SeasonalNormals::new(4.0, 12.0, 20.0, 13.0)),
    ("Tokyo", SeasonalNormals::new(6.0, 15.0, 27.0, 18.0)),
    ("Moscow", SeasonalNormals::new(-10.0, 5.0, 18.0, 8.0)),
    ("Sydney", SeasonalNormals::new(12.0, 18.0, 25.0, 20.0)),
    ("Berlin", SeasonalNormals::new(0.0, 10.0, 20.0, 11.0)),
    ("Beijing", SeasonalNormals::new(-2.0, 13.0, 27.0, 16.0)),
    ("Rio de Janeiro", SeasonalNormals::new(20.0, 25.0, 30.0, 25.0)),
    ("Dubai", SeasonalNormals::new(20.0, 30.0, 40.0, 30.0)),
    ("Los Angeles", SeasonalNormals::new(15.0, 18.0, 25.0, 20.0)),
    ("Singapore", SeasonalNormals::new(27.0, 28.0, 28.0, 27.0)),
    ("Mumbai", SeasonalNormals::new(25.0, 30.0, 35.0, 30.0)),
    ("Cairo", SeasonalNormals::new(15.0, 25.0, 35.0, 25.0)),
    ("Mexico City", SeasonalNormals::new(12.0, 18.0, 20.0, 15.0)),
];

/// Seasonal normals keyed by city name, built once on first use.
pub static SEASONAL_NORMALS: LazyLock<HashMap<&'static str, SeasonalNormals>> =
    LazyLock::new(|| NORMALS_TABLE.iter().copied().collect());

/// Built-in cities in table order.
pub fn known_cities() -> Vec<&'static str> {
    NORMALS_TABLE.iter().map(|(city, _)| *city).collect()
}

pub fn normals_for(city: &str) -> Option<&'static SeasonalNormals> {
    SEASONAL_NORMALS.get(city)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_map_to_meteorological_seasons() {
        let expected = [
            Season::Winter,
            Season::Winter,
            Season::Spring,
            Season::Spring,
            Season::Spring,
            Season::Summer,
            Season::Summer,
            Season::Summer,
            Season::Autumn,
            Season::Autumn,
            Season::Autumn,
            Season::Winter,
        ];
        for (month, season) in (1..=12).zip(expected) {
            let date = NaiveDate::from_ymd_opt(2015, month, 10).unwrap();
            assert_eq!(Season::of_date(date), season, "month {month}");
        }
    }

    #[test]
    fn display_uses_lowercase_name() {
        let names: Vec<String> = Season::all().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["winter", "spring", "summer", "autumn"]);
    }

    #[test]
    fn normals_table_covers_known_cities() {
        let cities = known_cities();
        assert_eq!(cities.len(), 15);
        assert_eq!(cities[0], "New York");

        for city in cities {
            assert!(normals_for(city).is_some(), "missing normals for {city}");
        }

        let moscow = normals_for("Moscow").unwrap();
        assert_eq!(moscow.mean_for(Season::Winter), -10.0);
        assert_eq!(moscow.mean_for(Season::Summer), 18.0);
        assert!(normals_for("Atlantis").is_none());
    }
}
