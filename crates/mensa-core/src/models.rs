use serde::{Deserialize, Serialize};

/// One meal offering at one location on one day - what the API serves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    /// Date token exactly as the feed writes it (e.g. "20.10.2026")
    pub date: String,
    pub location: String,
    pub name: String,
    pub price: Price,
    pub nutrition: Nutrition,
    pub allergens: Vec<String>,
    pub co2_rating: String,
    pub co2_value: f64,
    pub is_climate_friendly: bool,
}

/// Prices in euros, always with two fraction digits ("3.50")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub student: String,
    pub employee: String,
    pub guest: String,
}

/// Nutrition values per portion as decimal strings with a dot separator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    /// Whole kilocalories
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

impl Nutrition {
    pub const DEFAULT_CALORIES: &'static str = "0";
    pub const DEFAULT_GRAMS: &'static str = "0.0";

    /// True when every field is still at its default, i.e. nothing was
    /// found in the feed text
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for Nutrition {
    fn default() -> Self {
        Self {
            calories: Self::DEFAULT_CALORIES.to_string(),
            protein: Self::DEFAULT_GRAMS.to_string(),
            carbs: Self::DEFAULT_GRAMS.to_string(),
            fat: Self::DEFAULT_GRAMS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meal_record_json_shape() {
        let record = MealRecord {
            date: "20.10.2026".to_string(),
            location: "Contine".to_string(),
            name: "Gemüsecurry".to_string(),
            price: Price {
                student: "2.90".to_string(),
                employee: "4.30".to_string(),
                guest: "5.60".to_string(),
            },
            nutrition: Nutrition::default(),
            allergens: vec!["a".to_string(), "g".to_string()],
            co2_rating: "A".to_string(),
            co2_value: 412.5,
            is_climate_friendly: true,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "date": "20.10.2026",
                "location": "Contine",
                "name": "Gemüsecurry",
                "price": {"student": "2.90", "employee": "4.30", "guest": "5.60"},
                "nutrition": {"calories": "0", "protein": "0.0", "carbs": "0.0", "fat": "0.0"},
                "allergens": ["a", "g"],
                "co2Rating": "A",
                "co2Value": 412.5,
                "isClimateFriendly": true
            })
        );
    }

    #[test]
    fn test_nutrition_is_empty() {
        assert!(Nutrition::default().is_empty());

        let nutrition = Nutrition {
            protein: "4.2".to_string(),
            ..Nutrition::default()
        };
        assert!(!nutrition.is_empty());
    }
}
