//! Request parameter values and their flattening into MWS query parameters.
//!
//! MWS encodes repeated elements as `ListName.ElementName.N`:
//!
//! ```rust
//! use mwskit_core::{resolve, ParamValue, Params};
//!
//! let params = Params::new().with(
//!     "IdList",
//!     ParamValue::list([ParamValue::record([("Id", "A1")]), ParamValue::record([("Id", "B2")])]),
//! );
//! let flat = resolve(&params).unwrap();
//! assert_eq!(flat["IdList.Id.1"], "A1");
//! assert_eq!(flat["IdList.Id.2"], "B2");
//! ```

use std::collections::{BTreeMap, HashMap};

use time::OffsetDateTime;

use crate::error::ParamError;
use crate::timestamp::format_iso8601;

/// One parameter value before flattening.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    Timestamp(OffsetDateTime),
    /// Repeated element; items are either all records or all scalars.
    List(Vec<ParamValue>),
    /// Named fields of one list element.
    Record(Vec<(String, ParamValue)>),
}

impl ParamValue {
    pub fn list(items: impl IntoIterator<Item = ParamValue>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn record<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Converts a JSON value: arrays become lists, objects become records.
    pub fn from_json(key: &str, value: &serde_json::Value) -> Result<Self, ParamError> {
        use serde_json::Value;

        match value {
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Bool(flag) => Ok(Self::Bool(*flag)),
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Ok(Self::Integer(integer))
                } else if let Some(decimal) = number.as_f64() {
                    Ok(Self::Decimal(decimal))
                } else {
                    Err(ParamError::UnsupportedJson {
                        key: key.to_owned(),
                        kind: "number",
                    })
                }
            }
            Value::Array(items) => items
                .iter()
                .map(|item| Self::from_json(key, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Value::Object(fields) => fields
                .iter()
                .map(|(name, field)| Ok((name.clone(), Self::from_json(key, field)?)))
                .collect::<Result<Vec<_>, ParamError>>()
                .map(Self::Record),
            Value::Null => Err(ParamError::UnsupportedJson {
                key: key.to_owned(),
                kind: "null",
            }),
        }
    }

    const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    fn render_scalar(&self, key: &str) -> Result<String, ParamError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Integer(integer) => Ok(integer.to_string()),
            Self::Decimal(decimal) => Ok(decimal.to_string()),
            Self::Bool(flag) => Ok(flag.to_string()),
            Self::Timestamp(ts) => {
                format_iso8601(*ts).ok_or_else(|| ParamError::UnformattableTimestamp {
                    key: key.to_owned(),
                })
            }
            Self::List(_) => Err(ParamError::NestedList {
                key: key.to_owned(),
            }),
            Self::Record(_) => Err(ParamError::UnexpectedRecord {
                key: key.to_owned(),
            }),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<OffsetDateTime> for ParamValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Caller-supplied parameters keyed by MWS parameter name.
///
/// Re-inserting a key replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.entries.iter()
    }

    /// Adds every entry of `other`, replacing existing keys.
    pub fn extend(&mut self, other: &Params) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Builds params from a JSON object.
    pub fn from_json_object(
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, ParamError> {
        let mut params = Self::new();
        for (key, value) in object {
            params.insert(key.clone(), ParamValue::from_json(key, value)?);
        }
        Ok(params)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Flattens parameters into the string map that gets signed and sent.
pub fn resolve(params: &Params) -> Result<BTreeMap<String, String>, ParamError> {
    let mut resolved = BTreeMap::new();

    for (key, value) in params.iter() {
        match value {
            ParamValue::List(items) => flatten_list(key, items, &mut resolved)?,
            scalar => {
                resolved.insert(key.clone(), scalar.render_scalar(key)?);
            }
        }
    }

    Ok(resolved)
}

fn flatten_list(
    key: &str,
    items: &[ParamValue],
    out: &mut BTreeMap<String, String>,
) -> Result<(), ParamError> {
    let records = items.iter().filter(|item| item.is_record()).count();
    if records != 0 && records != items.len() {
        return Err(ParamError::MixedList {
            key: key.to_owned(),
        });
    }

    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut next = |name: &str| {
        let count = counters.entry(name.to_owned()).or_insert(0);
        *count += 1;
        *count
    };

    if records == 0 {
        if items.is_empty() {
            return Ok(());
        }
        let element = element_name_suffix(key)?;
        for item in items {
            let n = next(element);
            out.insert(format!("{key}.{element}.{n}"), item.render_scalar(key)?);
        }
        return Ok(());
    }

    for item in items {
        if let ParamValue::Record(fields) = item {
            for (name, value) in fields {
                let n = next(name);
                out.insert(format!("{key}.{name}.{n}"), value.render_scalar(key)?);
            }
        }
    }

    Ok(())
}

/// Returns the trailing capitalized word of a camel-case key.
///
/// `OrderId` → `Id`, `ItemStatus` → `Status`, `ASINList` → `List`. The word
/// starts at the last upper-case character that follows a lower-case letter or
/// digit, or that ends an acronym run and is followed by a lower-case letter.
/// Keys without such a boundary (`id`, `Id`, `ID`) are rejected.
pub fn element_name_suffix(key: &str) -> Result<&str, ParamError> {
    let chars: Vec<(usize, char)> = key.char_indices().collect();

    for index in (1..chars.len()).rev() {
        let (offset, current) = chars[index];
        if !current.is_uppercase() {
            continue;
        }

        let previous = chars[index - 1].1;
        let camel_hump = previous.is_lowercase() || previous.is_ascii_digit();
        let acronym_end = previous.is_uppercase()
            && chars
                .get(index + 1)
                .is_some_and(|(_, next)| next.is_lowercase());

        if camel_hump || acronym_end {
            return Ok(&key[offset..]);
        }
    }

    Err(ParamError::NoElementBoundary {
        key: key.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn record_lists_use_dotted_element_names() {
        let params = Params::new().with(
            "IdList",
            ParamValue::list([
                ParamValue::record([("Id", "ASDFG")]),
                ParamValue::record([("Id", "FDDSAG")]),
            ]),
        );

        let resolved = resolve(&params).expect("valid params");

        let expected: BTreeMap<String, String> = [
            ("IdList.Id.1", "ASDFG"),
            ("IdList.Id.2", "FDDSAG"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn counters_are_independent_per_inner_key() {
        let params = Params::new().with(
            "Items",
            ParamValue::list([
                ParamValue::record([("Sku", "S1")]),
                ParamValue::record([("Sku", "S2"), ("Qty", "3")]),
                ParamValue::record([("Qty", "4")]),
            ]),
        );

        let resolved = resolve(&params).expect("valid params");

        assert_eq!(resolved.len(), 4);
        assert_eq!(resolved["Items.Sku.1"], "S1");
        assert_eq!(resolved["Items.Sku.2"], "S2");
        assert_eq!(resolved["Items.Qty.1"], "3");
        assert_eq!(resolved["Items.Qty.2"], "4");
    }

    #[test]
    fn scalar_lists_infer_the_element_name() {
        let params = Params::new()
            .with("OrderStatus", vec!["Unshipped", "PartiallyShipped"])
            .with("MarketplaceId", vec!["ATVPDKIKX0DER"]);

        let resolved = resolve(&params).expect("valid params");

        assert_eq!(resolved["OrderStatus.Status.1"], "Unshipped");
        assert_eq!(resolved["OrderStatus.Status.2"], "PartiallyShipped");
        assert_eq!(resolved["MarketplaceId.Id.1"], "ATVPDKIKX0DER");
    }

    #[test]
    fn element_suffix_takes_last_capitalized_word() {
        assert_eq!(element_name_suffix("OrderId").expect("boundary"), "Id");
        assert_eq!(element_name_suffix("ItemStatus").expect("boundary"), "Status");
        assert_eq!(element_name_suffix("ASINList").expect("boundary"), "List");
        assert_eq!(element_name_suffix("sellerSku").expect("boundary"), "Sku");
    }

    #[test]
    fn element_suffix_rejects_keys_without_boundary() {
        for key in ["id", "Id", "ID", "", "status"] {
            let err = element_name_suffix(key).expect_err("no boundary");
            assert_eq!(err, ParamError::NoElementBoundary { key: key.to_owned() });
        }
    }

    #[test]
    fn timestamps_and_numbers_are_coerced() {
        let params = Params::new()
            .with("CreatedAfter", datetime!(2017-04-07 12:30:00 UTC))
            .with("MaxResultsPerPage", 50)
            .with("Price", 19.5);

        let resolved = resolve(&params).expect("valid params");

        assert_eq!(resolved["CreatedAfter"], "2017-04-07T12:30:00Z");
        assert_eq!(resolved["MaxResultsPerPage"], "50");
        assert_eq!(resolved["Price"], "19.5");
    }

    #[test]
    fn mixed_lists_are_rejected() {
        let params = Params::new().with(
            "IdList",
            ParamValue::list([ParamValue::record([("Id", "A1")]), ParamValue::from("B2")]),
        );

        let err = resolve(&params).expect_err("mixed list");
        assert_eq!(err, ParamError::MixedList { key: String::from("IdList") });
    }

    #[test]
    fn nested_structures_are_rejected() {
        let nested = Params::new().with(
            "IdList",
            ParamValue::list([ParamValue::list([ParamValue::from("A")])]),
        );
        assert!(matches!(resolve(&nested), Err(ParamError::NestedList { .. })));

        let bare_record = Params::new().with("Address", ParamValue::record([("City", "Oslo")]));
        assert!(matches!(
            resolve(&bare_record),
            Err(ParamError::UnexpectedRecord { .. })
        ));
    }

    #[test]
    fn scalar_list_with_lowercase_key_fails() {
        let params = Params::new().with("ids", vec!["A"]);
        assert!(matches!(
            resolve(&params),
            Err(ParamError::NoElementBoundary { .. })
        ));
    }

    #[test]
    fn json_values_convert_to_params() {
        let json = serde_json::json!({
            "IdType": "ASIN",
            "IdList": [{"Id": "A1"}, {"Id": "B2"}],
            "Limit": 5,
            "Flag": true
        });
        let object = json.as_object().expect("object");

        let params = Params::from_json_object(object).expect("convertible");
        let resolved = resolve(&params).expect("valid params");

        assert_eq!(resolved["IdType"], "ASIN");
        assert_eq!(resolved["IdList.Id.2"], "B2");
        assert_eq!(resolved["Limit"], "5");
        assert_eq!(resolved["Flag"], "true");

        let err = ParamValue::from_json("Bad", &serde_json::Value::Null).expect_err("null");
        assert!(matches!(err, ParamError::UnsupportedJson { kind: "null", .. }));
    }
}
