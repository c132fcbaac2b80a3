use nalgebra::Matrix4;

/// Slot of a joint in its table; also the slot of its skinning matrix.
pub type JointIndex = usize;

/// One skeletal bone.
///
/// Parent and child edges are table indices; the table owns every joint.
#[derive(Debug, Clone)]
pub struct Joint {
    pub(crate) name: String,
    pub(crate) source_name: String,
    pub(crate) index: JointIndex,
    pub(crate) inverse_bind_matrix: Matrix4<f32>,
    pub(crate) bind_matrix: Matrix4<f32>,
    pub(crate) local_transform: Matrix4<f32>,
    pub(crate) parent: Option<JointIndex>,
    pub(crate) children: Vec<JointIndex>,
}

impl Joint {
    /// Creates an unattached joint with an identity local transform.
    ///
    /// Returns the joint and whether its inverse bind matrix was invertible.
    /// A singular matrix keeps an identity bind matrix.
    pub(crate) fn new(
        name: String,
        index: JointIndex,
        inverse_bind_matrix: Matrix4<f32>,
    ) -> (Self, bool) {
        let inverse = inverse_bind_matrix.try_inverse();
        let invertible = inverse.is_some();
        let joint = Self {
            source_name: name.clone(),
            name,
            index,
            inverse_bind_matrix,
            bind_matrix: inverse.unwrap_or_else(Matrix4::identity),
            local_transform: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
        };
        (joint, invertible)
    }

    /// Name this joint is registered under in its table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the linked scene object, before collision renaming.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn index(&self) -> JointIndex {
        self.index
    }

    pub fn inverse_bind_matrix(&self) -> &Matrix4<f32> {
        &self.inverse_bind_matrix
    }

    /// Inverse of the inverse bind matrix (identity when it was singular).
    pub fn bind_matrix(&self) -> &Matrix4<f32> {
        &self.bind_matrix
    }

    pub fn local_transform(&self) -> &Matrix4<f32> {
        &self.local_transform
    }

    pub fn parent(&self) -> Option<JointIndex> {
        self.parent
    }

    pub fn children(&self) -> &[JointIndex] {
        &self.children
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.source_name
    }
}
