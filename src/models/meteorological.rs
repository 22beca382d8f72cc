use crate::reconcile::ReconciledFields;
use chrono::FixedOffset;
use serde_json::{Map, Value};

const TODAY_KEY: &str = "hoje";
const UPCOMING_KEY: &str = "futuro";

/// A weather-hazard record from the INMET feed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeteorologicalAlert {
    pub fields: ReconciledFields,
    /// GeoJSON text from `poligono`. Embedded objects are re-serialized.
    pub geometry: Option<String>,
}

impl MeteorologicalAlert {
    pub fn from_object(record: &Map<String, Value>, offset: FixedOffset) -> Self {
        let geometry = match record.get("poligono") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(value @ Value::Object(_)) => Some(value.to_string()),
            _ => None,
        };

        Self {
            fields: ReconciledFields::from_object(record, offset),
            geometry,
        }
    }
}

/// The feed body, flattened into individual records.
///
/// Accepted shapes: a flat array of alerts, `[{ "hoje": [...], "futuro": [...] }]`,
/// the same buckets as a bare object, or a single alert object.
#[derive(Debug, Default)]
pub struct FeedPayload {
    records: Vec<Value>,
}

impl FeedPayload {
    pub fn from_value(body: Value) -> Self {
        let records = match body {
            Value::Array(items) => match items.first().and_then(bucket_object) {
                Some(buckets) => flatten_buckets(buckets),
                None => items,
            },
            Value::Object(object) => {
                if has_buckets(&object) {
                    flatten_buckets(&object)
                } else {
                    vec![Value::Object(object)]
                }
            }
            _ => Vec::new(),
        };

        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in feed order, `hoje` before `futuro`.
    pub fn into_records(self) -> Vec<Value> {
        self.records
    }
}

fn has_buckets(object: &Map<String, Value>) -> bool {
    object.contains_key(TODAY_KEY) || object.contains_key(UPCOMING_KEY)
}

fn bucket_object(first: &Value) -> Option<&Map<String, Value>> {
    first.as_object().filter(|o| has_buckets(o))
}

fn flatten_buckets(buckets: &Map<String, Value>) -> Vec<Value> {
    [TODAY_KEY, UPCOMING_KEY]
        .iter()
        .filter_map(|key| buckets.get(*key).and_then(Value::as_array))
        .flatten()
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(payload: FeedPayload) -> Vec<i64> {
        payload
            .into_records()
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn flat_array_is_taken_as_is() {
        let payload = FeedPayload::from_value(json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(ids(payload), vec![1, 2]);
    }

    #[test]
    fn wrapped_buckets_are_flattened_today_first() {
        let body = json!([{
            "futuro": [{ "id": 3 }],
            "hoje": [{ "id": 1 }, { "id": 2 }]
        }]);
        assert_eq!(ids(FeedPayload::from_value(body)), vec![1, 2, 3]);
    }

    #[test]
    fn missing_bucket_is_tolerated() {
        let body = json!([{ "hoje": [{ "id": 7 }] }]);
        assert_eq!(ids(FeedPayload::from_value(body)), vec![7]);

        let body = json!({ "futuro": [{ "id": 9 }], "hoje": null });
        assert_eq!(ids(FeedPayload::from_value(body)), vec![9]);
    }

    #[test]
    fn single_object_is_one_record() {
        let payload = FeedPayload::from_value(json!({ "id": 5, "municipios": "Natal - RN" }));
        assert_eq!(ids(payload), vec![5]);
    }

    #[test]
    fn scalar_body_is_empty() {
        assert!(FeedPayload::from_value(Value::Null).is_empty());
        assert!(FeedPayload::from_value(json!([])).is_empty());
    }

    #[test]
    fn geometry_is_read_from_string_or_object() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let as_text = json!({ "poligono": "{\"type\":\"Polygon\",\"coordinates\":[]}" });
        let as_object = json!({ "poligono": { "type": "Polygon", "coordinates": [] } });
        let missing = json!({ "poligono": "" });

        let a = MeteorologicalAlert::from_object(as_text.as_object().unwrap(), offset);
        let b = MeteorologicalAlert::from_object(as_object.as_object().unwrap(), offset);
        let c = MeteorologicalAlert::from_object(missing.as_object().unwrap(), offset);
        assert!(a.geometry.is_some());
        assert!(b.geometry.unwrap().contains("Polygon"));
        assert!(c.geometry.is_none());
    }
}
