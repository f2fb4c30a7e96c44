use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Box geometry and spacing, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub person_width: f64,
    pub person_height: f64,
    /// Horizontal grid unit. Child centering is only promised to within a quarter of it.
    pub grid_x: f64,
    /// Vertical gap between generation rows.
    pub grid_y: f64,
    pub spouse_gap: f64,
    pub sibling_gap: f64,
    /// Gap between sibling groups of different unions, and between unrelated trees.
    pub child_gap: f64,
    pub padding: f64,
    /// Lower bound for every horizontal gap between boxes in a row.
    pub min_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            person_width: 160.0,
            person_height: 80.0,
            grid_x: 20.0,
            grid_y: 60.0,
            spouse_gap: 20.0,
            sibling_gap: 40.0,
            child_gap: 80.0,
            padding: 40.0,
            min_gap: 20.0,
        }
    }
}

impl LayoutConfig {
    /// Builds a config from a (possibly partial) JSON object; missing fields keep their
    /// defaults.
    pub fn from_value(value: &Value) -> Result<Self, LayoutError> {
        Self::default().overlay(value)
    }

    /// Returns a copy of `self` with the fields present in `patch` replaced.
    pub fn overlay(&self, patch: &Value) -> Result<Self, LayoutError> {
        let Value::Object(patch) = patch else {
            return Err(LayoutError::MalformedConfig {
                message: format!("expected a JSON object, got `{patch}`"),
            });
        };

        let mut base: Map<String, Value> = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (k, v) in patch {
            base.insert(k.clone(), v.clone());
        }

        serde_json::from_value(Value::Object(base)).map_err(|err| LayoutError::MalformedConfig {
            message: err.to_string(),
        })
    }

    fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("personWidth", self.person_width),
            ("personHeight", self.person_height),
            ("gridX", self.grid_x),
            ("gridY", self.grid_y),
            ("spouseGap", self.spouse_gap),
            ("siblingGap", self.sibling_gap),
            ("childGap", self.child_gap),
            ("padding", self.padding),
            ("minGap", self.min_gap),
        ]
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        for (field, value) in self.fields() {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }

    /// Distance between the tops of two consecutive generation rows.
    pub fn row_pitch(&self) -> f64 {
        self.person_height + self.grid_y
    }

    pub fn centering_tolerance(&self) -> f64 {
        self.grid_x / 4.0
    }

    pub(crate) fn spouse_spacing(&self) -> f64 {
        self.spouse_gap.max(self.min_gap)
    }

    pub(crate) fn sibling_spacing(&self) -> f64 {
        self.sibling_gap.max(self.min_gap)
    }

    pub(crate) fn child_spacing(&self) -> f64 {
        self.child_gap.max(self.min_gap)
    }

    /// Width of `count` partner boxes standing side by side.
    pub(crate) fn household_width(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        count as f64 * self.person_width + (count - 1) as f64 * self.spouse_spacing()
    }
}
