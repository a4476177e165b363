//! Wire schemas for the three remote endpoints and the host chart metadata.
//!
//! Responses are decoded through these types before anything reaches widget
//! state; a payload that does not match is reported as malformed.

use crate::core::types::DatasetKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Columns requested from the dataset search endpoint
pub const DATASET_COLUMNS: [&str; 5] = [
    "id",
    "table_name",
    "datasource_type",
    "database.database_name",
    "schema",
];

/// Parameters of a single dataset search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetQuery {
    pub search: String,
    /// 0-based page index
    pub page: u32,
    pub page_size: u32,
}

impl DatasetQuery {
    pub fn new(search: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            search: search.into(),
            page,
            page_size,
        }
    }

    /// The JSON form of the query, sorted by table name and filtered with a
    /// case-insensitive `contains` on the table name
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "columns": DATASET_COLUMNS,
            "filters": [{ "col": "table_name", "opr": "ct", "value": self.search }],
            "page": self.page,
            "page_size": self.page_size,
            "order_column": "table_name",
            "order_direction": "asc",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRef {
    pub database_name: String,
}

/// One record of the dataset search `result` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i64,
    pub table_name: String,
    #[serde(default)]
    pub datasource_type: Option<String>,
    #[serde(default)]
    pub database: Option<DatabaseRef>,
    #[serde(default)]
    pub schema: Option<String>,
}

impl DatasetRecord {
    /// Table name, followed by `database.schema` when known
    pub fn display_label(&self) -> String {
        let location = match (&self.database, &self.schema) {
            (Some(db), Some(schema)) if !schema.is_empty() => {
                Some(format!("{}.{}", db.database_name, schema))
            }
            (Some(db), _) => Some(db.database_name.clone()),
            (None, Some(schema)) if !schema.is_empty() => Some(schema.clone()),
            _ => None,
        };
        match location {
            Some(loc) => format!("{} ({})", self.table_name, loc),
            None => self.table_name.clone(),
        }
    }
}

/// A selectable dataset entry in the picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOption {
    pub id: i64,
    pub key: DatasetKey,
    pub label: String,
    pub table_name: String,
    pub datasource_type: String,
}

impl From<DatasetRecord> for DatasetOption {
    fn from(record: DatasetRecord) -> Self {
        let label = record.display_label();
        Self {
            id: record.id,
            key: DatasetKey::new(record.id, record.table_name.clone()),
            label,
            datasource_type: record.datasource_type.unwrap_or_else(|| "table".to_string()),
            table_name: record.table_name,
        }
    }
}

/// A page of dataset search results
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetPage {
    pub data: Vec<DatasetOption>,
    pub total_count: u64,
}

impl DatasetPage {
    /// Decode a raw search response.
    ///
    /// `result` must be an array and every record must decode, otherwise the
    /// whole page is rejected. A missing `count` falls back to the number of
    /// records returned.
    pub fn from_response(body: &Value) -> Result<Self, String> {
        let results = body
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| "Invalid response format: `result` is not an array".to_string())?;

        let data = results
            .iter()
            .map(|item| {
                serde_json::from_value::<DatasetRecord>(item.clone())
                    .map(DatasetOption::from)
                    .map_err(|e| format!("Invalid dataset record: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_count = match body.get("count") {
            None | Some(Value::Null) => data.len() as u64,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| format!("Invalid response format: `count` is {v}"))?,
        };

        Ok(Self { data, total_count })
    }
}

/// Body of a chart generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub dataset_id: i64,
    pub dashboard_id: Option<i64>,
    pub bliv_dashboard_base_url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ChartResponse {
    status: String,
    #[serde(default)]
    data: Option<ChartResponseData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ChartResponseData {
    chart_id: Value,
    url: String,
}

/// Decoded result of a chart generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Created { chart_id: String, url: String },
    /// The service answered with something other than `status: "success"`
    Rejected { status: String },
}

impl ChartOutcome {
    pub fn from_response(body: &Value) -> Result<Self, String> {
        let parsed: ChartResponse = serde_json::from_value(body.clone())
            .map_err(|e| format!("Invalid chart response: {e}"))?;
        if parsed.status != "success" {
            return Ok(Self::Rejected {
                status: parsed.status,
            });
        }
        let data = parsed
            .data
            .ok_or_else(|| "Invalid chart response: `data` missing".to_string())?;
        let chart_id = match data.chart_id {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.is_empty() => s,
            other => return Err(format!("Invalid chart response: chart_id is {other}")),
        };
        Ok(Self::Created {
            chart_id,
            url: data.url,
        })
    }
}

/// Metadata of a chart hosted on the dashboard, loaded from the charts file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    #[serde(default)]
    pub slice_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub viz_type: String,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
}

impl ChartMetadata {
    /// Whether the visualization has meaningful x/y axes
    pub fn is_cartesian(&self) -> bool {
        let viz = self.viz_type.to_ascii_lowercase();
        let viz = viz.strip_prefix("echarts_").unwrap_or(&viz);
        const CARTESIAN: [&str; 9] = [
            "bar", "dist_bar", "line", "area", "scatter", "bubble", "histogram", "box_plot",
            "timeseries",
        ];
        CARTESIAN.iter().any(|c| viz == *c || viz.starts_with(&format!("{c}_")))
    }
}

/// Body of an insight generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    pub chart_title: String,
    pub chart_description: String,
    pub data: Vec<Map<String, Value>>,
    pub visualization_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
}

impl InsightRequest {
    pub fn from_chart(chart: &ChartMetadata) -> Self {
        let (x_axis, y_axis) = if chart.is_cartesian() {
            (chart.x_axis.clone(), chart.y_axis.clone())
        } else {
            (None, None)
        };
        Self {
            chart_title: chart.title.clone(),
            chart_description: chart.description.clone(),
            data: chart.rows.clone(),
            visualization_type: chart.viz_type.clone(),
            x_axis,
            y_axis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsightResponse {
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pie_chart() -> ChartMetadata {
        serde_json::from_value(json!({
            "slice_id": 7,
            "title": "Sales Distribution",
            "description": "Distribution of sales across regions",
            "viz_type": "pie",
            "rows": [{"region": "North", "sales": 100}, {"region": "South", "sales": 150}],
            "x_axis": "Region",
            "y_axis": "Sales"
        }))
        .unwrap()
    }

    #[test]
    fn test_dataset_page_decodes_records() {
        let body = json!({
            "count": 12,
            "result": [
                {"id": 4, "table_name": "orders", "datasource_type": "table",
                 "database": {"database_name": "warehouse"}, "schema": "public"},
                {"id": 9, "table_name": "regions"}
            ]
        });
        let page = DatasetPage::from_response(&body).unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].key, DatasetKey::new(4, "orders"));
        assert_eq!(page.data[0].label, "orders (warehouse.public)");
        assert_eq!(page.data[1].label, "regions");
        assert_eq!(page.data[1].datasource_type, "table");
    }

    #[test]
    fn test_dataset_page_empty_result() {
        let page = DatasetPage::from_response(&json!({"result": [], "count": 0})).unwrap();
        assert_eq!(page, DatasetPage { data: vec![], total_count: 0 });
    }

    #[test]
    fn test_dataset_page_rejects_non_array() {
        assert!(DatasetPage::from_response(&json!({"result": {"id": 1}})).is_err());
        assert!(DatasetPage::from_response(&json!({"message": "nope"})).is_err());
        assert!(DatasetPage::from_response(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_dataset_page_no_partial_results() {
        let body = json!({"result": [{"id": 1, "table_name": "a"}, {"table_name": "b"}], "count": 2});
        assert!(DatasetPage::from_response(&body).is_err());
    }

    #[test]
    fn test_dataset_page_missing_count() {
        let body = json!({"result": [{"id": 1, "table_name": "a"}]});
        assert_eq!(DatasetPage::from_response(&body).unwrap().total_count, 1);
    }

    #[test]
    fn test_chart_outcome_success() {
        let body = json!({"status": "success", "data": {"chart_id": 42, "url": "http://x"}});
        assert_eq!(
            ChartOutcome::from_response(&body).unwrap(),
            ChartOutcome::Created { chart_id: "42".into(), url: "http://x".into() }
        );
    }

    #[test]
    fn test_chart_outcome_rejected_and_malformed() {
        let rejected = json!({"status": "error", "message": "insufficient"});
        assert_eq!(
            ChartOutcome::from_response(&rejected).unwrap(),
            ChartOutcome::Rejected { status: "error".into() }
        );
        assert!(ChartOutcome::from_response(&json!({"status": "success"})).is_err());
        assert!(ChartOutcome::from_response(&json!({"data": {}})).is_err());
        assert!(ChartOutcome::from_response(&json!("success")).is_err());
    }

    #[test]
    fn test_insight_request_skips_axes_for_pie() {
        let request = InsightRequest::from_chart(&pie_chart());
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["visualization_type"], "pie");
        assert_eq!(body["data"][1]["sales"], 150);
        assert!(body.get("x_axis").is_none());
        assert!(body.get("y_axis").is_none());
    }

    #[test]
    fn test_insight_request_keeps_axes_for_bar() {
        let mut chart = pie_chart();
        chart.viz_type = "echarts_timeseries_bar".to_string();
        let request = InsightRequest::from_chart(&chart);
        assert_eq!(request.x_axis.as_deref(), Some("Region"));
        assert_eq!(request.y_axis.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_dataset_query_json() {
        let q = DatasetQuery::new("sal", 2, 25).to_json();
        assert_eq!(q["filters"][0]["value"], "sal");
        assert_eq!(q["filters"][0]["opr"], "ct");
        assert_eq!(q["page"], 2);
        assert_eq!(q["order_direction"], "asc");
    }
}
