use serde_json::{Map, Value};

use super::IngestError;
use aw_config::IngestConfig;

/// One raw input record, reduced to the fields the engine uses.
///
/// The timestamp is kept unparsed so that aggregation can drop and count
/// bad timestamps without failing the whole batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp: Value,
    /// Mention count, or 1 when the input carries no weight field.
    pub weight: f64,
    pub entity: Option<String>,
}

/// Records read from one input document.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<RawRecord>,
    /// Whether the weight field was present (on every record).
    pub using_weights: bool,
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct entity values, sorted.
    pub fn entities(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .records
            .iter()
            .filter_map(|r| r.entity.clone())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Read records from a JSON array of objects or from JSON lines.
///
/// Schema checks run over the whole document before anything is returned:
/// every record must be an object carrying the timestamp field (and the
/// entity field when one is configured), and the weight field must be
/// present on all records or on none.
pub fn read_records(text: &str, fields: &IngestConfig) -> Result<RecordBatch, IngestError> {
    let objects = parse_objects(text)?;

    let with_weight = objects
        .iter()
        .filter(|o| o.contains_key(&fields.weight_field))
        .count();
    if with_weight != 0 && with_weight != objects.len() {
        return Err(IngestError::Schema(format!(
            "field '{}' is present on {} of {} records",
            fields.weight_field,
            with_weight,
            objects.len()
        )));
    }
    let using_weights = !objects.is_empty() && with_weight == objects.len();

    let mut records = Vec::with_capacity(objects.len());
    for (i, obj) in objects.into_iter().enumerate() {
        let timestamp = obj.get(&fields.timestamp_field).cloned().ok_or_else(|| {
            IngestError::Schema(format!(
                "record {} is missing field '{}'",
                i, fields.timestamp_field
            ))
        })?;

        let weight = if using_weights {
            parse_weight(i, obj.get(&fields.weight_field))?
        } else {
            1.0
        };

        let entity = match &fields.entity_field {
            Some(field) => Some(entity_value(i, field, obj.get(field))?),
            None => None,
        };

        records.push(RawRecord {
            timestamp,
            weight,
            entity,
        });
    }

    Ok(RecordBatch {
        records,
        using_weights,
    })
}

fn parse_objects(text: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
    let trimmed = text.trim_start();
    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| IngestError::Malformed(format!("invalid JSON array: {}", e)))?
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    IngestError::Malformed(format!("line {}: invalid JSON: {}", n + 1, e))
                })
            })
            .collect::<Result<_, _>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Object(map) => Ok(map),
            other => Err(IngestError::Schema(format!(
                "record {} is not an object: {}",
                i, other
            ))),
        })
        .collect()
}

fn parse_weight(record: usize, value: Option<&Value>) -> Result<f64, IngestError> {
    let invalid = |v: &Value| IngestError::InvalidWeight {
        record,
        value: v.to_string(),
    };
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(&Value::Number(n.clone()))),
        Some(Value::String(raw)) => {
            let s = raw.trim();
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .ok()
                .filter(|w| w.is_finite())
                .ok_or_else(|| IngestError::InvalidWeight {
                    record,
                    value: raw.clone(),
                })
        }
        Some(other) => Err(invalid(other)),
    }
}

fn entity_value(record: usize, field: &str, value: Option<&Value>) -> Result<String, IngestError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Null) | None => Err(IngestError::Schema(format!(
            "record {} is missing field '{}'",
            record, field
        ))),
        Some(other) => Err(IngestError::Schema(format!(
            "record {}: field '{}' must be a scalar, got {}",
            record, field, other
        ))),
    }
}
