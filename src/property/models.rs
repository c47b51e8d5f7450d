use serde::{Deserialize, Deserializer, Serialize};

/// A property as the repository hands it to the engine.
///
/// Numeric attributes are kept raw: scraped listings mix numbers with
/// strings like `"1,850 sqft"` or `"n/a"`, and interpretation belongs to
/// the feature normalizer. `price` is expressed in minor currency units
/// (cents).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    #[serde(default)]
    pub address: Address,
    /// Canonical (`"condo"`) or free-text (`"Single Family Home"`) labels
    /// are accepted; unrecognised labels leave the type unknown.
    #[serde(default, deserialize_with = "deserialize_property_type")]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub price: Option<RawValue>,
    #[serde(default)]
    pub square_feet: Option<RawValue>,
    #[serde(default)]
    pub bedrooms: Option<RawValue>,
    #[serde(default)]
    pub bathrooms: Option<RawValue>,
    #[serde(default)]
    pub lot_size: Option<RawValue>,
    #[serde(default)]
    pub year_built: Option<RawValue>,
    #[serde(default)]
    pub location_score: Option<RawValue>,
    #[serde(default)]
    pub condition_score: Option<RawValue>,
    /// Free-form feature tags ("pool", "garage", ...).
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.street, self.city)?;
        if let Some(state) = &self.state {
            write!(f, ", {state}")?;
        }
        Ok(())
    }
}

/// A raw attribute value as scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Condo,
    Townhouse,
    Apartment,
    Land,
}

impl PropertyType {
    /// Parse a listing label ("Single Family Home", "Vacant lot", ...).
    ///
    /// Matches whole words, last word first, so the head noun wins:
    /// "Lot-view house" is a house.
    pub fn from_label(label: &str) -> Option<Self> {
        label
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .rev()
            .find_map(Self::from_word)
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "house" | "home" | "residence" | "dwelling" | "bungalow" | "cottage" => {
                Some(PropertyType::House)
            }
            "condo" | "condominium" => Some(PropertyType::Condo),
            "townhouse" | "townhome" | "rowhouse" | "terrace" => Some(PropertyType::Townhouse),
            "apartment" | "flat" | "unit" => Some(PropertyType::Apartment),
            "land" | "lot" | "acreage" => Some(PropertyType::Land),
            _ => None,
        }
    }
}

fn deserialize_property_type<'de, D>(deserializer: D) -> Result<Option<PropertyType>, D::Error>
where
    D: Deserializer<'de>,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(PropertyType::from_label))
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::House => write!(f, "House"),
            PropertyType::Condo => write!(f, "Condo"),
            PropertyType::Townhouse => write!(f, "Townhouse"),
            PropertyType::Apartment => write!(f, "Apartment"),
            PropertyType::Land => write!(f, "Land"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_from_label() {
        let cases = [
            ("house", Some(PropertyType::House)),
            ("Single Family Home", Some(PropertyType::House)),
            ("Lot-view house", Some(PropertyType::House)),
            ("Condominium", Some(PropertyType::Condo)),
            ("Townhome", Some(PropertyType::Townhouse)),
            ("Community unit", Some(PropertyType::Apartment)),
            ("Vacant lot", Some(PropertyType::Land)),
            ("Lotus Plaza office", None),
            ("", None),
        ];
        for (label, expected) in cases {
            assert_eq!(PropertyType::from_label(label), expected, "{label}");
        }
    }

    #[test]
    fn test_record_accepts_free_text_property_type() {
        let scraped: PropertyRecord =
            serde_json::from_str(r#"{"id": "a", "property_type": "Single Family Home"}"#).unwrap();
        assert_eq!(scraped.property_type, Some(PropertyType::House));

        let unknown: PropertyRecord =
            serde_json::from_str(r#"{"id": "b", "property_type": "Warehouse"}"#).unwrap();
        assert_eq!(unknown.property_type, None);

        let null: PropertyRecord =
            serde_json::from_str(r#"{"id": "c", "property_type": null}"#).unwrap();
        assert_eq!(null.property_type, None);
    }

    #[test]
    fn test_record_deserializes_mixed_raw_values() {
        let json = r#"{
            "id": "p-1",
            "address": {"street": "12 Elm St", "city": "Springfield", "state": "IL"},
            "property_type": "condo",
            "price": 42500000,
            "square_feet": "1,850 sqft",
            "bedrooms": 3,
            "features": ["Pool"]
        }"#;

        let record: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.property_type, Some(PropertyType::Condo));
        assert_eq!(record.price, Some(RawValue::Number(42_500_000.0)));
        assert_eq!(record.square_feet, Some(RawValue::Text("1,850 sqft".to_string())));
        assert!(record.lot_size.is_none());
        assert_eq!(record.address.to_string(), "12 Elm St, Springfield, IL");
    }
}
