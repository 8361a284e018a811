use crate::animation::binding::BoneBinding;
use crate::animation::clip::AnimationClip;
use crate::skeleton::Skeleton;

pub struct Binder;

impl Binder {
    /// Resolves every track of `clip` to a bone of `skeleton` by name.
    ///
    /// Tracks naming a bone the skeleton does not have are dropped with a
    /// warning; the bone keeps its rest pose.
    #[must_use]
    pub fn bind(skeleton: &Skeleton, clip: &AnimationClip) -> Vec<BoneBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_idx, track) in clip.tracks.iter().enumerate() {
            let bone_name = &track.meta.bone_name;
            if let Some(bone_index) = skeleton.find(bone_name) {
                bindings.push(BoneBinding {
                    track_index: track_idx,
                    bone_index,
                    target: track.meta.target,
                });
            } else {
                log::warn!(
                    "Clip '{}' animates unknown bone '{}', track ignored",
                    clip.name,
                    bone_name
                );
            }
        }

        bindings
    }
}
