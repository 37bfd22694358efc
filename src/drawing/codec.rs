use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::LogicalPoint;
use crate::drawing::manager::DrawingManager;
use crate::drawing::model::{Drawing, DrawingId, DrawingKind, DrawingState, DrawingStyle};
use crate::error::{ChartError, ChartResult};

pub const DRAWINGS_JSON_SCHEMA_V1: u32 = 1;

fn default_visible() -> bool {
    true
}

/// Flat persisted form of a drawing.
///
/// The variant tag lands in `type` and variant scalars sit next to the common
/// fields. Pixel geometry and other derived values are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingRecord {
    pub id: DrawingId,
    #[serde(flatten)]
    pub kind: DrawingKind,
    pub points: Vec<LogicalPoint>,
    pub style: DrawingStyle,
    pub state: DrawingState,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

impl DrawingRecord {
    /// Parses one record, reporting an unknown `type` distinctly from other
    /// shape errors.
    pub fn from_json_value(value: Value) -> ChartResult<Self> {
        let type_name = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ChartError::InvalidRecord("missing `type` field".to_owned()))?;
        if !DrawingKind::catalog()
            .iter()
            .any(|kind| kind.type_name() == type_name)
        {
            return Err(ChartError::UnknownDrawingType(type_name.to_owned()));
        }
        serde_json::from_value(value)
            .map_err(|e| ChartError::InvalidRecord(format!("failed to parse drawing record: {e}")))
    }
}

impl Drawing {
    /// Selection is view state: a selected drawing is stored as complete.
    #[must_use]
    pub fn to_record(&self) -> DrawingRecord {
        DrawingRecord {
            id: self.id,
            kind: self.kind.clone(),
            points: self.points.clone(),
            style: self.style,
            state: match self.state {
                DrawingState::Selected => DrawingState::Complete,
                state => state,
            },
            visible: self.visible,
            locked: self.locked,
        }
    }

    /// Rebuilds a drawing, failing without constructing a partial one.
    pub fn from_record(record: DrawingRecord) -> ChartResult<Self> {
        let drawing = Self {
            id: record.id,
            kind: record.kind,
            points: record.points,
            style: record.style,
            state: match record.state {
                DrawingState::Selected => DrawingState::Complete,
                state => state,
            },
            visible: record.visible,
            locked: record.locked,
        };
        drawing.validate()?;
        Ok(drawing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingsJsonContractV1 {
    pub schema_version: u32,
    pub drawings: Vec<DrawingRecord>,
}

#[derive(Debug, Deserialize)]
struct RawContract {
    schema_version: u32,
    drawings: Vec<Value>,
}

/// Outcome of loading a persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

impl DrawingManager {
    /// Records for every stored drawing in insertion order.
    #[must_use]
    pub fn to_records(&self) -> Vec<DrawingRecord> {
        self.drawings().map(Drawing::to_record).collect()
    }

    pub fn to_json_contract_v1_pretty(&self) -> ChartResult<String> {
        let payload = DrawingsJsonContractV1 {
            schema_version: DRAWINGS_JSON_SCHEMA_V1,
            drawings: self.to_records(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize drawings contract v1: {e}"))
        })
    }

    /// Replaces the collection with `records`, skipping any that fail
    /// validation.
    pub fn load_records(&mut self, records: impl IntoIterator<Item = DrawingRecord>) -> LoadReport {
        self.clear();
        let mut report = LoadReport::default();
        for record in records {
            let id = record.id;
            if self.get(id).is_some() {
                // First record with an id wins.
                warn!(%id, "skipping duplicate drawing id");
                report.skipped += 1;
                continue;
            }
            match Drawing::from_record(record).and_then(|drawing| self.insert(drawing)) {
                Ok(_) => report.loaded += 1,
                Err(err) => {
                    warn!(%id, error = %err, "skipping drawing record");
                    report.skipped += 1;
                }
            }
        }
        debug!(loaded = report.loaded, skipped = report.skipped, "drawings loaded");
        report
    }

    /// Loads a v1 contract or a bare record array.
    ///
    /// Malformed records are skipped; only an unreadable payload or an
    /// unsupported schema version is an error.
    pub fn load_json_contract(&mut self, input: &str) -> ChartResult<LoadReport> {
        let payload: Value = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse drawings json payload: {e}"))
        })?;
        let values = match payload {
            Value::Array(values) => values,
            payload => {
                let contract: RawContract = serde_json::from_value(payload).map_err(|e| {
                    ChartError::InvalidData(format!("failed to parse drawings contract: {e}"))
                })?;
                if contract.schema_version != DRAWINGS_JSON_SCHEMA_V1 {
                    return Err(ChartError::InvalidData(format!(
                        "unsupported drawings schema version: {}",
                        contract.schema_version
                    )));
                }
                contract.drawings
            }
        };

        let mut unreadable = 0;
        let records = values
            .into_iter()
            .filter_map(|value| match DrawingRecord::from_json_value(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable drawing record");
                    unreadable += 1;
                    None
                }
            })
            .collect::<Vec<_>>();
        let mut report = self.load_records(records);
        report.skipped += unreadable;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::DrawingRecord;
    use crate::error::ChartError;

    #[test]
    fn record_is_flat_with_variant_scalars() {
        let value = json!({
            "id": 4,
            "type": "regressionChannel",
            "deviationMultiplier": 1.5,
            "points": [{"time": 1.0, "price": 10.0}, {"time": 9.0, "price": 12.0}],
            "style": {
                "color": {"red": 0.0, "green": 0.0, "blue": 1.0, "alpha": 1.0},
                "lineWidth": 1.0,
                "dash": "solid",
                "fillColor": null,
                "fillOpacity": 0.2
            },
            "state": "complete"
        });
        let record = DrawingRecord::from_json_value(value).expect("record");
        assert!(record.visible);
        assert!(!record.locked);
        let out = serde_json::to_value(&record).expect("serialize");
        assert_eq!(out["type"], "regressionChannel");
        assert_eq!(out["deviationMultiplier"], 1.5);
    }

    #[test]
    fn unknown_type_is_reported() {
        let err = DrawingRecord::from_json_value(json!({"id": 1, "type": "pitchfork"}))
            .expect_err("unknown");
        assert!(matches!(err, ChartError::UnknownDrawingType(name) if name == "pitchfork"));
    }
}
