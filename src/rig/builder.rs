use std::collections::{HashMap, hash_map::Entry};

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use super::joint::{Joint, JointIndex};
use super::table::{JointTable, ROOT_INDEX};
use super::weights::RawWeights;
use crate::log_debug;
use crate::note::{Note, Notes};

// ─── Limits ──────────────────────────────────────────────────────────────────

/// Joint ceiling (root excluded) above which consumers may refuse to render.
pub const DEFAULT_MAX_JOINTS: usize = 100;

pub const DEFAULT_ROOT_NAME: &str = "root";

// ─── Input records ───────────────────────────────────────────────────────────

/// Identity of a scene object as assigned by the file parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

/// Scene object a cluster binds vertices to.
#[derive(Debug, Clone)]
pub struct LinkedObject {
    pub id: ObjectId,
    pub name: String,
    /// Parent object, which may be absent or outside the linked set.
    pub parent: Option<ObjectId>,
}

/// One skin cluster: a joint, its bind transform, and the vertices it moves.
#[derive(Debug, Clone)]
pub struct ClusterRecord {
    pub link: Option<LinkedObject>,
    /// Inverse bind matrix of the linked joint.
    pub transform: Matrix4<f32>,
    /// Vertex indices, parallel to `weights`.
    pub indices: Vec<u32>,
    pub weights: Vec<f64>,
}

impl ClusterRecord {
    pub fn new(id: u64, name: &str, parent: Option<u64>, transform: Matrix4<f32>) -> Self {
        Self {
            link: Some(LinkedObject {
                id: ObjectId(id),
                name: name.to_string(),
                parent: parent.map(ObjectId),
            }),
            transform,
            indices: Vec::new(),
            weights: Vec::new(),
        }
    }

    pub fn with_weights(mut self, indices: Vec<u32>, weights: Vec<f64>) -> Self {
        self.indices = indices;
        self.weights = weights;
        self
    }
}

// ─── Options ─────────────────────────────────────────────────────────────────

/// How a joint whose name is already registered gets its table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCollisionPolicy {
    /// Every duplicate becomes `<name>_1`, replacing any earlier `<name>_1`
    /// binding.
    Legacy,
    /// The first unused `<name>_N` for N = 1, 2, ...
    #[default]
    Sequential,
}

/// Hierarchy build settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Name of the synthetic root joint.
    pub root_name: String,
    /// Joint count (root excluded) above which a fatal note is recorded.
    pub max_joints: usize,
    pub name_collision: NameCollisionPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            max_joints: DEFAULT_MAX_JOINTS,
            name_collision: NameCollisionPolicy::default(),
        }
    }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Result of [`build_hierarchy`]: the skeleton, the per-vertex influences it
/// collected, and everything noteworthy seen along the way.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuild {
    pub table: JointTable,
    pub raw_weights: RawWeights,
    pub notes: Notes,
}

// ─── Build ───────────────────────────────────────────────────────────────────

/// Build a joint table from unordered cluster records.
///
/// Joints are created in record order after a synthetic root at slot 0.
/// Parents are resolved in a second pass, once every joint exists, so a
/// child may precede its parent in `records`. Unresolvable parents attach to
/// the root. Nothing here fails: problems become notes and the table is as
/// complete as the input allows. An empty `records` yields a fatal note and
/// an empty table.
pub fn build_hierarchy(records: &[ClusterRecord], options: &BuildOptions) -> HierarchyBuild {
    let mut notes = Notes::new();

    if records.is_empty() {
        notes.push(Note::fatal("NO_CLUSTERS", "No clusters in skin"));
        return HierarchyBuild {
            notes,
            ..HierarchyBuild::default()
        };
    }

    let mut table = JointTable::with_root(&options.root_name);
    // Originating record per joint slot; the root has none.
    let mut sources: Vec<Option<usize>> = vec![None];
    let mut joints_by_object: HashMap<ObjectId, JointIndex> = HashMap::new();

    for (record_index, record) in records.iter().enumerate() {
        let Some(link) = record.link.as_ref() else {
            notes.push(Note::warning(
                "CLUSTER_WITHOUT_LINK",
                format!("Cluster {record_index} has no linked object and was skipped"),
            ));
            continue;
        };

        if link.name.is_empty() {
            notes.push(Note::warning(
                "EMPTY_JOINT_NAME",
                format!("Cluster {record_index} links an object with an empty name"),
            ));
        }

        let (index, invertible) = table.push_joint(link.name.clone(), record.transform);
        sources.push(Some(record_index));

        if !invertible {
            notes.push(Note::warning(
                "NON_INVERTIBLE_BIND_MATRIX",
                format!(
                    "Inverse bind matrix of joint \"{}\" is not invertible; its bind matrix is identity",
                    link.name
                ),
            ));
        }

        match joints_by_object.entry(link.id) {
            Entry::Vacant(entry) => {
                entry.insert(index);
            }
            Entry::Occupied(entry) => {
                notes.push(Note::warning(
                    "DUPLICATE_LINK_OBJECT",
                    format!(
                        "Object {} is linked by joints {} and {}; parent lookups use joint {}",
                        link.id.0,
                        entry.get(),
                        index,
                        entry.get()
                    ),
                ));
            }
        }

        register_joint_name(&mut table, index, &link.name, options.name_collision, &mut notes);
    }

    let joint_count = table.len() - 1;
    if joint_count > options.max_joints {
        notes.push(Note::fatal(
            "TOO_MANY_JOINTS",
            format!(
                "Skeleton has {} joints; at most {} are supported",
                joint_count, options.max_joints
            ),
        ));
    }

    for index in 1..table.len() {
        let parent_object = sources[index]
            .and_then(|record_index| records[record_index].link.as_ref())
            .and_then(|link| link.parent);
        let resolved = parent_object.and_then(|object| joints_by_object.get(&object).copied());

        let parent = match resolved {
            Some(parent) if closes_cycle(&table, parent, index) => {
                notes.push(Note::warning(
                    "PARENT_CYCLE",
                    format!(
                        "Parent of joint \"{}\" would form a cycle; attached to root",
                        joint_name(&table, index)
                    ),
                ));
                ROOT_INDEX
            }
            Some(parent) => parent,
            None => ROOT_INDEX,
        };
        table.attach(parent, index);
    }

    let raw_weights = collect_raw_weights(&table, &sources, records, &mut notes);

    notes.push(Note::info(
        "SKELETON_BUILT",
        format!(
            "Built {} joints from {} clusters; {} vertices carry influences",
            joint_count,
            records.len(),
            raw_weights.len()
        ),
    ));
    log_debug!(
        "hierarchy: {} root children, {} named joints",
        table.children(ROOT_INDEX).count(),
        table.names().count()
    );

    HierarchyBuild {
        table,
        raw_weights,
        notes,
    }
}

fn register_joint_name(
    table: &mut JointTable,
    index: JointIndex,
    name: &str,
    policy: NameCollisionPolicy,
    notes: &mut Notes,
) {
    if !table.contains_name(name) {
        table.register_name(name.to_string(), index);
        return;
    }

    let renamed = match policy {
        NameCollisionPolicy::Legacy => format!("{name}_1"),
        NameCollisionPolicy::Sequential => {
            let mut suffix = 1usize;
            let mut candidate = format!("{name}_{suffix}");
            while table.contains_name(&candidate) {
                suffix += 1;
                candidate = format!("{name}_{suffix}");
            }
            candidate
        }
    };

    notes.push(Note::warning(
        "JOINT_NAME_COLLISION",
        format!("Joint name \"{name}\" already exists; joint {index} registered as \"{renamed}\""),
    ));

    if let Some(previous) = table.register_name(renamed.clone(), index) {
        notes.push(Note::warning(
            "JOINT_NAME_OVERWRITTEN",
            format!("Joint {previous} is no longer reachable by name \"{renamed}\""),
        ));
    }
}

/// Whether making `parent` the parent of `child` would close a loop.
///
/// Attached edges always form a forest, so the upward walk terminates.
fn closes_cycle(table: &JointTable, parent: JointIndex, child: JointIndex) -> bool {
    let mut current = Some(parent);
    while let Some(index) = current {
        if index == child {
            return true;
        }
        current = table.get(index).and_then(Joint::parent);
    }
    false
}

fn joint_name(table: &JointTable, index: JointIndex) -> &str {
    table.get(index).map(Joint::name).unwrap_or_default()
}

fn collect_raw_weights(
    table: &JointTable,
    sources: &[Option<usize>],
    records: &[ClusterRecord],
    notes: &mut Notes,
) -> RawWeights {
    let mut raw_weights = RawWeights::new();

    for index in 1..table.len() {
        let Some(record) = sources
            .get(index)
            .copied()
            .flatten()
            .and_then(|record_index| records.get(record_index))
        else {
            notes.push(Note::warning(
                "NO_CLUSTER_FOR_JOINT",
                format!("No cluster for joint \"{}\"", joint_name(table, index)),
            ));
            continue;
        };

        if record.indices.len() != record.weights.len() {
            notes.push(Note::warning(
                "INDEX_WEIGHT_COUNT_MISMATCH",
                format!(
                    "Joint \"{}\" has {} vertex indices but {} weights; its weights were skipped",
                    joint_name(table, index),
                    record.indices.len(),
                    record.weights.len()
                ),
            ));
            continue;
        }

        for (vertex, weight) in record.indices.iter().zip(&record.weights) {
            raw_weights.push(*vertex, index, *weight as f32);
        }
    }

    raw_weights
}
