// Nutrition text extraction
//
// The feed carries nutrition as one free-text attribute, written either in
// German ("Brennwert=1046 kJ (250 kcal) Eiweiß=10,5 g ...") or in English
// ("Energy=1046 kJ (250 kcal) Protein=10,5 g ..."). Each quantity has an
// ordered list of patterns; the first one that matches wins.
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::Nutrition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    German,
    English,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::Calories,
        Quantity::Protein,
        Quantity::Carbs,
        Quantity::Fat,
    ];

    /// Value reported when no pattern matches
    pub fn default_value(self) -> &'static str {
        match self {
            Quantity::Calories => Nutrition::DEFAULT_CALORIES,
            _ => Nutrition::DEFAULT_GRAMS,
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Calories => write!(f, "calories"),
            Quantity::Protein => write!(f, "protein"),
            Quantity::Carbs => write!(f, "carbs"),
            Quantity::Fat => write!(f, "fat"),
        }
    }
}

/// Every pattern captures the number it extracts as `value`.
/// Order matters: German first, English as the fallback.
const PATTERN_TABLE: &[(Quantity, Language, &str)] = &[
    (Quantity::Calories, Language::German, r"Brennwert=\d+\s*kJ\s*\((?P<value>\d+)\s*kcal\)"),
    (Quantity::Calories, Language::English, r"Energy=\d+\s*kJ\s*\((?P<value>\d+)\s*kcal\)"),
    (Quantity::Protein, Language::German, r"Eiweiß=(?P<value>\d+[,.]?\d*)\s*g"),
    (Quantity::Protein, Language::English, r"Protein=(?P<value>\d+[,.]?\d*)\s*g"),
    (Quantity::Carbs, Language::German, r"Kohlenhydrate=(?P<value>\d+[,.]?\d*)\s*g"),
    (Quantity::Carbs, Language::English, r"Carbohydrates=(?P<value>\d+[,.]?\d*)\s*g"),
    (Quantity::Fat, Language::German, r"Fett=(?P<value>\d+[,.]?\d*)\s*g"),
    (Quantity::Fat, Language::English, r"Fat=(?P<value>\d+[,.]?\d*)\s*g"),
];

/// A compiled extraction pattern
#[derive(Debug)]
pub struct NutritionPattern {
    pub quantity: Quantity,
    pub language: Language,
    pub regex: Regex,
}

static PATTERNS: Lazy<Vec<NutritionPattern>> = Lazy::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|&(quantity, language, pattern)| NutritionPattern {
            quantity,
            language,
            regex: Regex::new(pattern).expect("nutrition patterns are valid regexes"),
        })
        .collect()
});

/// Patterns for one quantity, in the order they are tried
pub fn patterns_for(quantity: Quantity) -> impl Iterator<Item = &'static NutritionPattern> {
    PATTERNS.iter().filter(move |p| p.quantity == quantity)
}

/// Extract calories, protein, carbs and fat from a nutrition string.
///
/// Never fails: a missing string or a quantity no pattern finds comes back
/// as "0" (calories) or "0.0" (the rest).
pub fn extract_nutrition(text: Option<&str>) -> Nutrition {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => {
            debug!("No nutrition string provided");
            return Nutrition::default();
        }
    };

    debug!("Raw nutrition string: {}", text);

    let nutrition = Nutrition {
        calories: extract(Quantity::Calories, text),
        protein: extract(Quantity::Protein, text),
        carbs: extract(Quantity::Carbs, text),
        fat: extract(Quantity::Fat, text),
    };

    debug!("Parsed nutrition values: {:?}", nutrition);
    nutrition
}

fn extract(quantity: Quantity, text: &str) -> String {
    patterns_for(quantity)
        .find_map(|pattern| {
            let captures = pattern.regex.captures(text)?;
            debug!("Matched {} with {:?} pattern", quantity, pattern.language);
            Some(captures["value"].replace(',', "."))
        })
        .unwrap_or_else(|| {
            debug!("No match for {}", quantity);
            quantity.default_value().to_string()
        })
}
