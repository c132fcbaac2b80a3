//! Skeleton reconstruction and skinning data.

mod builder;
mod diagnostic;
mod joint;
mod model;
mod pose;
mod table;
mod transform;
mod weights;

pub use builder::{
    BuildOptions, ClusterRecord, DEFAULT_MAX_JOINTS, DEFAULT_ROOT_NAME, HierarchyBuild,
    LinkedObject, NameCollisionPolicy, ObjectId, build_hierarchy,
};
pub use diagnostic::{
    JointDiagnostic, SkeletonDiagnosticLog, SkinDiagnostic, collect_skeleton_diagnostic,
    diagnostic_log_path_for_input, write_skeleton_diagnostic_log,
};
pub use joint::{Joint, JointIndex};
pub use model::SkinnedModel;
pub use pose::evaluate_pose;
pub use table::{JointTable, ROOT_INDEX};
pub use transform::Transform;
pub use weights::{
    Influence, MAX_INFLUENCES, NO_JOINT, RawWeights, ResolvedWeights, SkinAttribute,
    VertexInfluence, resolve_weights,
};
