/// Bone property a track writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation, // LocalTransform::translation
    Rotation,    // LocalTransform::rotation
    Scale,       // LocalTransform::scale
}

/// Maps track `track_index` of a clip to a property of bone `bone_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneBinding {
    pub track_index: usize,
    pub bone_index: usize,
    pub target: TargetPath,
}
