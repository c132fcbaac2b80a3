//! Skin document handed over by an interchange-format parser.
//!
//! The parser itself lives elsewhere; this is the JSON shape it produces for
//! one skinned mesh.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::rig::{ClusterRecord, LinkedObject, ObjectId};

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub vertex_count: usize,
    /// `None` when the mesh carries no skin at all.
    #[serde(default)]
    pub clusters: Option<Vec<ClusterDocument>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterDocument {
    #[serde(default)]
    pub link: Option<LinkDocument>,
    /// Inverse bind matrix, column-major.
    #[serde(default = "identity_matrix")]
    pub transform: [f32; 16],
    #[serde(default)]
    pub indices: Vec<u32>,
    #[serde(default)]
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDocument {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parent: Option<u64>,
}

fn identity_matrix() -> [f32; 16] {
    IDENTITY
}

impl SkinDocument {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }

    /// Cluster records in document order, or `None` for an unskinned mesh.
    pub fn cluster_records(&self) -> Option<Vec<ClusterRecord>> {
        self.clusters
            .as_ref()
            .map(|clusters| clusters.iter().map(ClusterDocument::to_record).collect())
    }
}

impl ClusterDocument {
    fn to_record(&self) -> ClusterRecord {
        ClusterRecord {
            link: self.link.as_ref().map(|link| LinkedObject {
                id: ObjectId(link.id),
                name: link.name.clone(),
                parent: link.parent.map(ObjectId),
            }),
            transform: Matrix4::from_column_slice(&self.transform),
            indices: self.indices.clone(),
            weights: self.weights.clone(),
        }
    }
}

/// Parse a skin document from JSON text.
pub fn parse_skin_document(json: &str) -> Result<SkinDocument> {
    serde_json::from_str(json).context("failed to parse skin document JSON")
}

/// Load a skin document from a JSON file.
pub fn load_skin_document(path: &Path) -> Result<SkinDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read skin document: {}", path.display()))?;
    parse_skin_document(&content)
        .with_context(|| format!("invalid skin document: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Body",
        "vertex_count": 3,
        "clusters": [
            {
                "link": { "id": 10, "name": "Hips" },
                "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,-1,0,1],
                "indices": [0, 1],
                "weights": [1.0, 0.5]
            },
            { "link": { "id": 11, "name": "Spine", "parent": 10 } },
            { "indices": [2], "weights": [1.0] }
        ]
    }"#;

    #[test]
    fn given_sample_document_when_converting_then_records_keep_document_order() {
        let document = parse_skin_document(SAMPLE).expect("parse sample");

        let records = document.cluster_records().expect("skinned mesh");

        assert_eq!(document.display_name(), "Body");
        assert_eq!(records.len(), 3);
        let hips = records[0].link.as_ref().expect("Hips link");
        assert_eq!(hips.id, ObjectId(10));
        assert_eq!(records[1].link.as_ref().and_then(|link| link.parent), Some(ObjectId(10)));
        assert!(records[2].link.is_none());
    }

    #[test]
    fn given_column_major_transform_when_converting_then_translation_lands_in_last_column() {
        let document = parse_skin_document(SAMPLE).expect("parse sample");

        let records = document.cluster_records().expect("skinned mesh");

        assert_eq!(records[0].transform[(1, 3)], -1.0);
        assert_eq!(records[1].transform, Matrix4::identity());
    }

    #[test]
    fn given_document_without_clusters_when_converting_then_there_is_no_skin() {
        let document = parse_skin_document(r#"{ "vertex_count": 8 }"#).expect("parse");

        assert!(document.cluster_records().is_none());
        assert_eq!(document.display_name(), "(unnamed)");
    }

    #[test]
    fn given_malformed_json_when_parsing_then_error_has_context() {
        let err = parse_skin_document("{ \"clusters\": [] }").expect_err("vertex_count is required");

        assert!(err.to_string().contains("failed to parse skin document JSON"));
    }
}
