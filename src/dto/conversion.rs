use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Purchase order draft extracted from an uploaded document.
///
/// Dates are passed through as the assistant wrote them; the caller reviews the draft
/// before submitting it as a real order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConvertedPurchaseOrder {
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub expected_delivery_date: Option<String>,
    #[serde(default)]
    pub purchase_order_line_items: Vec<ConvertedLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConvertedLineItem {
    #[serde(deserialize_with = "int_or_string")]
    pub item_id: i32,
    #[serde(deserialize_with = "int_or_string")]
    pub quantity: i32,
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    #[schema(value_type = Option<f64>)]
    pub unit_cost: Option<Decimal>,
}

fn int_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(v) => v,
        Raw::Float(v) if v.fract() != 0.0 => {
            return Err(de::Error::custom(format!("expected an integer, got {}", v)))
        }
        // Only cast once the value is known to fit; `as` saturates silently.
        Raw::Float(v) if (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&v) => v as i64,
        Raw::Float(v) => return Err(de::Error::custom(format!("{} is out of range", v))),
        Raw::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("expected an integer, got '{}'", s)))?,
    };

    i32::try_from(value).map_err(|_| de::Error::custom(format!("{} is out of range", value)))
}
