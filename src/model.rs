use std::path::Path;

use serde::Deserialize;

use crate::error::{OutlineError, Result};
use crate::table::FeatureTable;
use crate::types::Label;

/// Maps feature rows to labels. Prediction must not mutate the classifier,
/// so one handle can be shared by concurrent document workers.
pub trait LabelClassifier: Send + Sync {
    /// Column schema the classifier was trained on, if it records one.
    fn expected_columns(&self) -> Option<&[String]>;

    /// One label per table row.
    fn predict(&self, table: &FeatureTable) -> Result<Vec<Label>>;
}

/// A trained classifier exported to JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Forest(ForestModel),
    Logistic(LogisticModel),
}

/// Read and validate a JSON model.
pub fn load_model(path: &Path) -> Result<Model> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        OutlineError::ModelUnavailable(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_model(&json)
}

pub fn parse_model(json: &str) -> Result<Model> {
    let model: Model = serde_json::from_str(json)
        .map_err(|e| OutlineError::ModelUnavailable(format!("invalid model: {e}")))?;
    model.validate()?;
    Ok(model)
}

impl Model {
    fn validate(&self) -> Result<()> {
        match self {
            Model::Forest(m) => m.validate(),
            Model::Logistic(m) => m.validate(),
        }
    }

    fn feature_names(&self) -> &[String] {
        match self {
            Model::Forest(m) => &m.feature_names,
            Model::Logistic(m) => &m.feature_names,
        }
    }

    fn predict_row(&self, row: &[f64]) -> Label {
        match self {
            Model::Forest(m) => m.predict_row(row),
            Model::Logistic(m) => m.predict_row(row),
        }
    }
}

impl LabelClassifier for Model {
    fn expected_columns(&self) -> Option<&[String]> {
        Some(self.feature_names())
    }

    fn predict(&self, table: &FeatureTable) -> Result<Vec<Label>> {
        if table.columns() != self.feature_names() {
            return Err(OutlineError::ModelUnavailable(format!(
                "table has {} columns, model expects {}",
                table.columns().len(),
                self.feature_names().len()
            )));
        }
        Ok(table.rows().iter().map(|row| self.predict_row(row)).collect())
    }
}

fn invalid(reason: String) -> OutlineError {
    OutlineError::ModelUnavailable(format!("invalid model: {reason}"))
}

/// Argmax with ties going to the earliest class.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = i;
        }
    }
    best
}

// ── Random forest ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    pub feature_names: Vec<String>,
    pub classes: Vec<Label>,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go left when `row[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (sample counts or fractions).
    Leaf { value: Vec<f64> },
}

impl ForestModel {
    fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(invalid("forest has no classes".into()));
        }
        if self.trees.is_empty() {
            return Err(invalid("forest has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(invalid(format!("tree {t} is empty")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split { feature, left, right, .. } => {
                        if *feature >= self.feature_names.len() {
                            return Err(invalid(format!("tree {t} node {i}: feature {feature} out of range")));
                        }
                        // Children after their parent keeps traversal acyclic.
                        for child in [left, right] {
                            if *child <= i || *child >= tree.nodes.len() {
                                return Err(invalid(format!("tree {t} node {i}: bad child {child}")));
                            }
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(invalid(format!(
                                "tree {t} node {i}: {} leaf values for {} classes",
                                value.len(),
                                self.classes.len()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Label {
        let mut votes = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let value = tree.leaf_for(row);
            let total: f64 = value.iter().sum();
            if total > 0.0 {
                for (vote, v) in votes.iter_mut().zip(value) {
                    *vote += v / total;
                }
            }
        }
        self.classes[argmax(&votes)]
    }
}

impl DecisionTree {
    fn leaf_for(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

// ── Multinomial logistic regression ────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub classes: Vec<Label>,
    /// One weight row per class.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticModel {
    fn validate(&self) -> Result<()> {
        let k = self.classes.len();
        if k == 0 {
            return Err(invalid("logistic model has no classes".into()));
        }
        if self.coefficients.len() != k || self.intercepts.len() != k {
            return Err(invalid(format!(
                "{} coefficient rows and {} intercepts for {k} classes",
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != self.feature_names.len()) {
            return Err(invalid(format!(
                "coefficient row has {} weights for {} features",
                row.len(),
                self.feature_names.len()
            )));
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Label {
        let scores: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(weights, b)| weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();
        self.classes[argmax(&scores)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::labeled;

    const FOREST: &str = r#"{
        "kind": "forest",
        "feature_names": ["font_size", "page"],
        "classes": ["title", "H1", "other"],
        "trees": [
            {"nodes": [
                {"feature": 0, "threshold": 14.0, "left": 1, "right": 2},
                {"value": [0, 0, 10]},
                {"value": [3, 7, 0]}
            ]},
            {"nodes": [
                {"feature": 0, "threshold": 20.0, "left": 1, "right": 2},
                {"value": [0, 1, 1]},
                {"value": [1, 0, 0]}
            ]}
        ]
    }"#;

    #[test]
    fn forest_averages_normalised_leaves() {
        let model = parse_model(FOREST).unwrap();
        let segments = [labeled(0, "Arial", 10.0), labeled(1, "Arial", 16.0), labeled(2, "Arial", 24.0)];
        let table = FeatureTable::for_classifier(&segments, model.expected_columns());
        let labels = model.predict(&table).unwrap();
        assert_eq!(labels, [Label::Other, Label::H1, Label::Title]);
    }

    #[test]
    fn logistic_takes_the_highest_score() {
        let model = parse_model(
            r#"{
                "kind": "logistic",
                "feature_names": ["font_size", "font_weight"],
                "classes": ["H2", "other"],
                "coefficients": [[1.0, 0.01], [0.0, 0.0]],
                "intercepts": [-20.0, 0.0]
            }"#,
        )
        .unwrap();
        let segments = [labeled(0, "Arial", 10.0), labeled(1, "Arial", 18.0)];
        let table = FeatureTable::for_classifier(&segments, model.expected_columns());
        assert_eq!(model.predict(&table).unwrap(), [Label::Other, Label::H2]);
    }

    #[test]
    fn malformed_models_are_unavailable() {
        let cases = [
            "not json",
            r#"{"kind": "svm"}"#,
            r#"{"kind": "forest", "feature_names": ["x"], "classes": ["H4"], "trees": []}"#,
            r#"{"kind": "forest", "feature_names": ["x"], "classes": ["H1"], "trees": []}"#,
            r#"{"kind": "forest", "feature_names": ["x"], "classes": ["H1"],
                "trees": [{"nodes": [{"feature": 0, "threshold": 1.0, "left": 0, "right": 1}, {"value": [1]}]}]}"#,
            r#"{"kind": "forest", "feature_names": ["x"], "classes": ["H1", "H2"],
                "trees": [{"nodes": [{"value": [1]}]}]}"#,
            r#"{"kind": "logistic", "feature_names": ["x"], "classes": ["H1"],
                "coefficients": [[1.0, 2.0]], "intercepts": [0.0]}"#,
        ];
        for json in cases {
            assert!(
                matches!(parse_model(json), Err(OutlineError::ModelUnavailable(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn missing_model_file_is_unavailable() {
        let err = load_model(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, OutlineError::ModelUnavailable(_)));
    }

    #[test]
    fn table_with_foreign_schema_is_rejected() {
        let model = parse_model(FOREST).unwrap();
        let table = FeatureTable::from_segments(&[labeled(0, "Arial", 10.0)]);
        assert!(matches!(model.predict(&table), Err(OutlineError::ModelUnavailable(_))));
    }
}
