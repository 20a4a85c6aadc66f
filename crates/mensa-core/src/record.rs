// Feed row -> MealRecord
//
// Rows are processed best-effort: only a foreign location or a missing name
// drops a row. Every other field that fails to parse falls back to its
// default and the row is kept.
use mensa_api::RawRow;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::models::{MealRecord, Price};
use crate::nutrition::extract_nutrition;

/// Attribute names used by the upstream feed
pub mod fields {
    pub const DATE: &str = "DATUM";
    pub const LOCATION: &str = "MENSA";
    pub const NAME: &str = "BESCHREIBUNG";
    pub const PRICE_STUDENT: &str = "PREIS_STUDENT";
    pub const PRICE_EMPLOYEE: &str = "PREIS_BEDIENSTETER";
    pub const PRICE_GUEST: &str = "PREIS_GAST";
    pub const NUTRITION: &str = "NAEHRWERTE";
    pub const ALLERGENS: &str = "KENNZEICHNUNG";
    pub const CO2_RATING: &str = "EXTINFO_CO2_BEWERTUNG";
    pub const CO2_VALUE: &str = "EXTINFO_CO2_WERT";
    pub const CO2_SAVINGS: &str = "EXTINFO_CO2_EINSPARUNG";
}

pub const DEFAULT_LOCATIONS: [&str; 3] = ["Mensa Campus Linden", "Hauptmensa", "Contine"];

/// Why a row did not make it into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSkipped {
    ForeignLocation(String),
    MissingName { location: String },
}

impl std::fmt::Display for RowSkipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSkipped::ForeignLocation(location) => {
                write!(f, "location '{}' is not on the allow-list", location)
            }
            RowSkipped::MissingName { location } => write!(f, "missing name for {}", location),
        }
    }
}

/// Turns feed rows into meal records for a fixed set of locations
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    allowed_locations: Vec<String>,
}

impl RecordBuilder {
    pub fn new<I, S>(allowed_locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_locations: allowed_locations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed_locations(&self) -> &[String] {
        &self.allowed_locations
    }

    pub fn is_allowed(&self, location: &str) -> bool {
        self.allowed_locations.iter().any(|l| l == location)
    }

    /// Build a record from one row, or say why the row is skipped
    pub fn build(&self, row: &RawRow) -> Result<MealRecord, RowSkipped> {
        let location = field(row, fields::LOCATION).unwrap_or_default();
        if !self.is_allowed(location) {
            return Err(RowSkipped::ForeignLocation(location.to_string()));
        }

        let name = match field(row, fields::NAME) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(RowSkipped::MissingName {
                    location: location.to_string(),
                })
            }
        };

        let nutrition = extract_nutrition(field(row, fields::NUTRITION));
        if nutrition.is_empty() {
            warn!("No nutrition values found for: {}", name);
        }

        Ok(MealRecord {
            date: field(row, fields::DATE).unwrap_or_default().to_string(),
            location: location.to_string(),
            name: name.to_string(),
            price: Price {
                student: format_price(field(row, fields::PRICE_STUDENT)),
                employee: format_price(field(row, fields::PRICE_EMPLOYEE)),
                guest: format_price(field(row, fields::PRICE_GUEST)),
            },
            nutrition,
            allergens: split_allergens(field(row, fields::ALLERGENS)),
            co2_rating: field(row, fields::CO2_RATING).unwrap_or_default().to_string(),
            co2_value: number_or_zero(field(row, fields::CO2_VALUE)),
            is_climate_friendly: number_or_zero(field(row, fields::CO2_SAVINGS)) > 0.0,
        })
    }

    /// Build records for every row in order, dropping skipped rows
    pub fn build_all(&self, rows: &[RawRow]) -> Vec<MealRecord> {
        let mut meals = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match self.build(row) {
                Ok(meal) => meals.push(meal),
                Err(skip @ RowSkipped::MissingName { .. }) => {
                    warn!("Skipping row {}: {}", index + 1, skip)
                }
                Err(skip) => debug!("Skipping row {}: {}", index + 1, skip),
            }
        }

        info!("Processed {} rows, kept {} meals", rows.len(), meals.len());
        meals
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATIONS)
    }
}

fn field<'a>(row: &'a RawRow, name: &str) -> Option<&'a str> {
    row.get(name).map(String::as_str)
}

static LEADING_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)").expect("decimal pattern is a valid regex")
});

/// Parse the leading decimal number of a feed value, accepting a comma as
/// the decimal separator. "3,50 €" is 3.5; "k.A." is None.
///
/// Exponents are not read: "1e3" is 1, not 1000. The feed writes plain
/// decimals only.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replacen(',', ".", 1);
    let number = LEADING_DECIMAL.find(&normalized)?;
    number.as_str().parse::<f64>().ok()
}

fn number_or_zero(raw: Option<&str>) -> f64 {
    match raw {
        Some(raw) => parse_decimal(raw).unwrap_or_else(|| {
            debug!("Unparsable number '{}', using 0", raw);
            0.0
        }),
        None => 0.0,
    }
}

/// Format a price with exactly two fraction digits, ties rounded away from
/// zero ("3,125" is "3.13"); missing or unparsable prices become "0.00"
pub fn format_price(raw: Option<&str>) -> String {
    let cents = (number_or_zero(raw) * 100.0).round();
    format!("{:.2}", cents / 100.0)
}

/// Split "a, g ,,i" into ["a", "g", "i"]
pub fn split_allergens(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
