//! Place-name lookup: a built-in table of Polish cities, or a
//! `worldcities.csv`-style file.

use crate::error::{Error, Result};
use crate::types::Location;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Names accepted in place of the name stored in the table.
const ALIASES: &[(&str, &str)] = &[("warszawa", "warsaw")];

/// Major Polish cities, coordinates rounded to two decimals.
const POLISH_CITIES: &[(&str, f64, f64)] = &[
    ("Warsaw", 52.23, 21.01),
    ("Kraków", 50.06, 19.94),
    ("Łódź", 51.78, 19.45),
    ("Wrocław", 51.11, 17.03),
    ("Poznań", 52.41, 16.93),
    ("Gdańsk", 54.35, 18.65),
    ("Szczecin", 53.43, 14.55),
    ("Bydgoszcz", 53.12, 18.01),
    ("Lublin", 51.25, 22.57),
    ("Białystok", 53.13, 23.16),
    ("Katowice", 50.26, 19.02),
    ("Gdynia", 54.52, 18.53),
    ("Częstochowa", 50.81, 19.12),
    ("Radom", 51.40, 21.15),
    ("Toruń", 53.02, 18.61),
    ("Rzeszów", 50.04, 22.00),
    ("Kielce", 50.87, 20.63),
    ("Olsztyn", 53.78, 20.48),
    ("Opole", 50.67, 17.93),
    ("Zielona Góra", 51.94, 15.51),
    ("Gorzów Wielkopolski", 52.73, 15.24),
    ("Sopot", 54.44, 18.56),
    ("Hel", 54.61, 18.80),
    ("Suwałki", 54.10, 22.93),
    ("Przemyśl", 49.78, 22.77),
    ("Zakopane", 49.30, 19.95),
];

#[derive(Debug, Clone)]
struct Entry {
    location: Location,
    ascii_name: Option<String>,
}

/// An in-memory list of named locations.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    entries: Vec<Entry>,
}

impl Gazetteer {
    pub fn builtin() -> Self {
        let entries = POLISH_CITIES
            .iter()
            .map(|&(name, latitude, longitude)| Entry {
                location: Location {
                    name: name.to_string(),
                    latitude,
                    longitude,
                },
                ascii_name: None,
            })
            .collect();
        Self { entries }
    }

    pub fn from_path(path: &Path, country: Option<&str>) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::Io(format!("cannot open gazetteer {}: {}", path.display(), e)))?;
        let gazetteer = Self::from_csv(file, country)?;
        log::debug!(
            "loaded {} place(s) from {}",
            gazetteer.len(),
            path.display()
        );
        Ok(gazetteer)
    }

    /// Reads a CSV file with a header naming at least the city, latitude and
    /// longitude columns. When `country` is given only matching rows are kept.
    pub fn from_csv<R: Read>(reader: R, country: Option<&str>) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header = reader.headers().map_err(csv_error)?.clone();
        if header.iter().all(str::is_empty) {
            return Err(Error::Gazetteer("file is empty".to_string()));
        }
        let columns = Columns::from_header(&header)?;

        if country.is_some() && columns.country.is_none() {
            return Err(Error::Gazetteer(
                "a country filter needs a 'country' column".to_string(),
            ));
        }

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line_number = record.position().map_or(0, |p| p.line());
            let field = |column: usize| {
                record.get(column).ok_or_else(|| {
                    Error::Gazetteer(format!(
                        "line {}: expected at least {} fields, found {}",
                        line_number,
                        column + 1,
                        record.len()
                    ))
                })
            };

            if let (Some(wanted), Some(column)) = (country, columns.country)
                && !field(column)?.eq_ignore_ascii_case(wanted.trim())
            {
                continue;
            }

            let name = field(columns.city)?.to_string();
            let latitude = parse_coordinate(field(columns.latitude)?, line_number)?;
            let longitude = parse_coordinate(field(columns.longitude)?, line_number)?;
            let location = Location::new(name, latitude, longitude)
                .map_err(|e| Error::Gazetteer(format!("line {}: {}", line_number, e)))?;
            let ascii_name = match columns.ascii {
                Some(column) => Some(field(column)?.to_string()),
                None => None,
            };
            entries.push(Entry {
                location,
                ascii_name,
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.entries.iter().map(|e| &e.location)
    }

    /// Looks up a place by name, ignoring case and Polish diacritics.
    /// The first matching row wins.
    pub fn resolve(&self, name: &str) -> Result<Location> {
        let mut key = fold_name(name);
        if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
            key = (*target).to_string();
        }

        self.entries
            .iter()
            .find(|entry| {
                fold_name(&entry.location.name) == key
                    || entry.ascii_name.as_deref().map(fold_name).as_deref() == Some(key.as_str())
            })
            .map(|entry| entry.location.clone())
            .ok_or_else(|| Error::UnknownLocation(name.trim().to_string()))
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

struct Columns {
    city: usize,
    ascii: Option<usize>,
    latitude: usize,
    longitude: usize,
    country: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            names.iter().find_map(|name| {
                header
                    .iter()
                    .position(|column| column.eq_ignore_ascii_case(name))
            })
        };
        let required = |names: &[&str]| {
            find(names).ok_or_else(|| {
                Error::Gazetteer(format!(
                    "header has no {} column: {}",
                    names.join("/"),
                    header.iter().collect::<Vec<_>>().join(",")
                ))
            })
        };

        let city = required(&["city", "name", "city_ascii"])?;
        let ascii = find(&["city_ascii"]).filter(|column| *column != city);
        Ok(Self {
            city,
            ascii,
            latitude: required(&["lat", "latitude"])?,
            longitude: required(&["lng", "lon", "longitude"])?,
            country: find(&["country"]),
        })
    }
}

fn csv_error(error: csv::Error) -> Error {
    match error.position() {
        Some(position) => Error::Gazetteer(format!("line {}: {}", position.line(), error)),
        None => Error::Gazetteer(error.to_string()),
    }
}

fn parse_coordinate(value: &str, line_number: u64) -> Result<f64> {
    let value: f64 = value.trim().parse().map_err(|_| {
        Error::Gazetteer(format!(
            "line {}: invalid coordinate '{}'",
            line_number,
            value.trim()
        ))
    })?;
    Ok((value * 100.0).round() / 100.0)
}

fn fold_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'ć' => 'c',
            'ę' => 'e',
            'ł' => 'l',
            'ń' => 'n',
            'ó' => 'o',
            'ś' => 's',
            'ź' | 'ż' => 'z',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\"city\",\"city_ascii\",\"lat\",\"lng\",\"country\",\"iso2\"
\"Tokyo\",\"Tokyo\",\"35.6897\",\"139.6922\",\"Japan\",\"JP\"
\"Warsaw\",\"Warsaw\",\"52.2300\",\"21.0111\",\"Poland\",\"PL\"
\"Kraków\",\"Krakow\",\"50.0614\",\"19.9372\",\"Poland\",\"PL\"
\"Washington, D.C.\",\"Washington, D.C.\",\"38.9047\",\"-77.0163\",\"United States\",\"US\"
";

    #[test]
    fn test_builtin_lookup() {
        let gazetteer = Gazetteer::builtin();
        let warsaw = gazetteer.resolve("Warsaw").unwrap();
        assert_eq!(warsaw.latitude, 52.23);
        assert_eq!(warsaw.longitude, 21.01);
        assert_eq!(gazetteer.resolve("Warszawa").unwrap(), warsaw);
        assert_eq!(gazetteer.resolve("  warsaw ").unwrap(), warsaw);
        assert_eq!(gazetteer.resolve("krakow").unwrap().name, "Kraków");
        assert_eq!(gazetteer.resolve("ŁÓDŹ").unwrap().name, "Łódź");
    }

    #[test]
    fn test_unknown_location() {
        assert_eq!(
            Gazetteer::builtin().resolve("Atlantis").unwrap_err(),
            Error::UnknownLocation("Atlantis".to_string())
        );
    }

    #[test]
    fn test_csv_with_country_filter() {
        let gazetteer = Gazetteer::from_csv(Cursor::new(SAMPLE), Some("poland")).unwrap();
        assert_eq!(gazetteer.len(), 2);
        let krakow = gazetteer.resolve("Krakow").unwrap();
        assert_eq!(krakow.name, "Kraków");
        assert_eq!(krakow.latitude, 50.06);
        assert_eq!(krakow.longitude, 19.94);
        assert!(matches!(
            gazetteer.resolve("Tokyo"),
            Err(Error::UnknownLocation(_))
        ));
    }

    #[test]
    fn test_csv_quoted_commas() {
        let gazetteer = Gazetteer::from_csv(Cursor::new(SAMPLE), None).unwrap();
        assert_eq!(gazetteer.len(), 4);
        let dc = gazetteer.resolve("washington, d.c.").unwrap();
        assert_eq!(dc.latitude, 38.9);
        assert_eq!(dc.longitude, -77.02);
    }

    #[test]
    fn test_csv_plain_header() {
        let data = "name,latitude,longitude\nBase,-77.85,166.67\n";
        let gazetteer = Gazetteer::from_csv(Cursor::new(data), None).unwrap();
        assert_eq!(gazetteer.resolve("base").unwrap().latitude, -77.85);
    }

    #[test]
    fn test_csv_errors() {
        assert!(matches!(
            Gazetteer::from_csv(Cursor::new(""), None),
            Err(Error::Gazetteer(_))
        ));
        assert!(matches!(
            Gazetteer::from_csv(Cursor::new("city,lat\nA,1\n"), None),
            Err(Error::Gazetteer(_))
        ));
        assert!(matches!(
            Gazetteer::from_csv(Cursor::new("city,lat,lng\nA,north,1\n"), None),
            Err(Error::Gazetteer(_))
        ));
        assert!(matches!(
            Gazetteer::from_csv(Cursor::new("city,lat,lng\nA,95,1\n"), None),
            Err(Error::Gazetteer(_))
        ));
        assert!(matches!(
            Gazetteer::from_csv(Cursor::new("city,lat,lng\nA,1,1\n"), Some("Poland")),
            Err(Error::Gazetteer(_))
        ));
        assert!(matches!(
            Gazetteer::from_csv(Cursor::new("city,lat,lng\n\"A,1,1\n"), None),
            Err(Error::Gazetteer(_))
        ));
    }

    #[test]
    fn test_csv_quoted_newlines_and_escapes() {
        let data = "city,lat,lng,note\r\n\"Say \"\"Hi\"\"\",10.0,20.0,\"two\nlines\"\r\nAfter,11.0,21.0,x\r\n";
        let gazetteer = Gazetteer::from_csv(Cursor::new(data), None).unwrap();
        assert_eq!(gazetteer.len(), 2);
        assert_eq!(gazetteer.resolve("say \"hi\"").unwrap().latitude, 10.0);
        assert_eq!(gazetteer.resolve("after").unwrap().longitude, 21.0);
    }

    #[test]
    fn test_csv_error_line_after_multiline_field() {
        let data = "city,lat,lng,note\nA,1,1,\"x\ny\"\nB,north,1,z\n";
        let error = Gazetteer::from_csv(Cursor::new(data), None).unwrap_err();
        assert_eq!(
            error,
            Error::Gazetteer("line 4: invalid coordinate 'north'".to_string())
        );
    }
}
