use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::joint::JointIndex;
use crate::note::{Note, Notes};

/// Influence slots per vertex in the output layout.
pub const MAX_INFLUENCES: usize = 4;

/// Joint slot value for an unused influence.
pub const NO_JOINT: i32 = -1;

/// One joint's pull on one vertex, as supplied by the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    pub joint: JointIndex,
    pub weight: f32,
}

/// Every influence recorded for one vertex, in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexInfluence {
    pub vertex_index: u32,
    pub influences: Vec<Influence>,
}

/// Vertex index to influence list, accumulated while reading clusters.
#[derive(Debug, Clone, Default)]
pub struct RawWeights {
    vertices: BTreeMap<u32, VertexInfluence>,
}

impl RawWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an influence after any already recorded for `vertex_index`.
    pub fn push(&mut self, vertex_index: u32, joint: JointIndex, weight: f32) {
        self.vertices
            .entry(vertex_index)
            .or_insert_with(|| VertexInfluence {
                vertex_index,
                influences: Vec::new(),
            })
            .influences
            .push(Influence { joint, weight });
    }

    pub fn get(&self, vertex_index: u32) -> Option<&VertexInfluence> {
        self.vertices.get(&vertex_index)
    }

    /// Vertices in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &VertexInfluence> {
        self.vertices.values()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl FromIterator<(u32, JointIndex, f32)> for RawWeights {
    fn from_iter<I: IntoIterator<Item = (u32, JointIndex, f32)>>(iter: I) -> Self {
        let mut raw = RawWeights::new();
        for (vertex_index, joint, weight) in iter {
            raw.push(vertex_index, joint, weight);
        }
        raw
    }
}

/// Fixed-width per-vertex skinning attribute.
///
/// Weights are non-increasing across slots. Unused slots hold weight 0.0 and
/// joint [`NO_JOINT`]. Weights are not renormalized; the consuming shader
/// owns normalization.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize)]
pub struct SkinAttribute {
    pub weights: [f32; MAX_INFLUENCES],
    pub joints: [i32; MAX_INFLUENCES],
}

impl SkinAttribute {
    /// Attribute of a vertex bound to no joint.
    pub const UNBOUND: Self = Self {
        weights: [0.0; MAX_INFLUENCES],
        joints: [NO_JOINT; MAX_INFLUENCES],
    };

    pub fn slot_count(&self) -> usize {
        self.joints.iter().filter(|joint| **joint != NO_JOINT).count()
    }

    pub fn is_unbound(&self) -> bool {
        self.slot_count() == 0
    }

    /// Used `(joint, weight)` slots, heaviest first.
    pub fn influences(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.joints
            .iter()
            .zip(self.weights.iter())
            .filter(|(joint, _)| **joint != NO_JOINT)
            .map(|(joint, weight)| (*joint, *weight))
    }

    /// Interleaved float layout: four weights, then four joint indices.
    pub fn to_floats(&self) -> [f32; MAX_INFLUENCES * 2] {
        let mut out = [0.0f32; MAX_INFLUENCES * 2];
        for slot in 0..MAX_INFLUENCES {
            out[slot] = self.weights[slot];
            out[MAX_INFLUENCES + slot] = self.joints[slot] as f32;
        }
        out
    }

    fn from_sorted(influences: &[Influence]) -> Self {
        let mut attribute = Self::UNBOUND;
        for (slot, influence) in influences.iter().take(MAX_INFLUENCES).enumerate() {
            attribute.weights[slot] = influence.weight;
            attribute.joints[slot] = i32::try_from(influence.joint).unwrap_or(NO_JOINT);
        }
        attribute
    }
}

impl Default for SkinAttribute {
    fn default() -> Self {
        Self::UNBOUND
    }
}

/// Output of [`resolve_weights`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedWeights {
    pub attributes: BTreeMap<u32, SkinAttribute>,
    /// Largest influence count seen on any single vertex.
    pub max_influences_seen: usize,
    /// Vertices that had more than [`MAX_INFLUENCES`] influences.
    pub overflow_vertices: usize,
    pub notes: Notes,
}

impl ResolvedWeights {
    /// Attribute for `vertex_index`; unbound when nothing influenced it.
    pub fn get(&self, vertex_index: u32) -> SkinAttribute {
        self.attributes
            .get(&vertex_index)
            .copied()
            .unwrap_or(SkinAttribute::UNBOUND)
    }

    /// One attribute per vertex in `0..vertex_count`.
    pub fn dense(&self, vertex_count: usize) -> Vec<SkinAttribute> {
        let mut out = vec![SkinAttribute::UNBOUND; vertex_count];
        for (vertex_index, attribute) in &self.attributes {
            if let Some(slot) = out.get_mut(*vertex_index as usize) {
                *slot = *attribute;
            }
        }
        out
    }

    /// Number of resolved vertices at or beyond `vertex_count`.
    pub fn out_of_range_count(&self, vertex_count: usize) -> usize {
        self.attributes
            .keys()
            .filter(|vertex_index| **vertex_index as usize >= vertex_count)
            .count()
    }
}

/// Sort each vertex's influences heaviest first and keep the top
/// [`MAX_INFLUENCES`].
///
/// Equal weights keep encounter order. Overflow is reported once for the
/// whole mesh with the worst case, never per vertex.
pub fn resolve_weights(raw: &RawWeights) -> ResolvedWeights {
    let mut resolved = ResolvedWeights::default();

    for vertex in raw.iter() {
        let count = vertex.influences.len();
        resolved.max_influences_seen = resolved.max_influences_seen.max(count);
        if count > MAX_INFLUENCES {
            resolved.overflow_vertices += 1;
        }

        let mut sorted = vertex.influences.clone();
        // `sort_by` is stable, which keeps equal weights in encounter order.
        sorted.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        resolved
            .attributes
            .insert(vertex.vertex_index, SkinAttribute::from_sorted(&sorted));
    }

    if resolved.overflow_vertices > 0 {
        resolved.notes.push(Note::warning(
            "TOO_MANY_INFLUENCES",
            format!(
                "More than {} joints per vertex not supported: {} vertices affected, worst case {} joints. Extra joints will be ignored",
                MAX_INFLUENCES, resolved.overflow_vertices, resolved.max_influences_seen
            ),
        ));
    }

    resolved
}
