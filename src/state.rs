//! Typed application states folded from the line
//!
//! Both projections replay the same line and differ only in the kind filter
//! and reducer. States are never persisted; they are pure functions of the
//! block set held at call time.

use crate::block::{Block, BlockKind, ContentId, Identity, Operation};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Current profile of one identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileState {
    /// Display username, empty until first set
    pub username: SmolStr,
    /// Bio text, empty until first set
    pub bio: SmolStr,
    /// Blob-store reference to the avatar, absent until first set
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<ContentId>,
    /// Followed identities, unique, in first-seen order
    pub following: Vec<Identity>,
}

impl ProfileState {
    /// Apply one profile operation; timeline operations are ignored
    fn apply(&mut self, op: &Operation) {
        match op {
            Operation::SetUsername { username } => self.username = username.clone(),
            Operation::SetBio { bio } => self.bio = bio.clone(),
            Operation::SetAvatar { avatar } => self.avatar = Some(avatar.clone()),
            Operation::AddFollowing { following_id } => {
                if !self.following.contains(following_id) {
                    self.following.push(following_id.clone());
                }
            }
            Operation::RemoveFollowing { following_id } => {
                self.following.retain(|followed| followed != following_id);
            }
            Operation::AddNote { .. } | Operation::RemoveNote { .. } => {}
        }
    }
}

/// Current timeline of one identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineState {
    /// Note references, unique, in first-seen order
    pub notes: Vec<ContentId>,
}

impl TimelineState {
    /// Apply one timeline operation; profile operations are ignored
    fn apply(&mut self, op: &Operation) {
        match op {
            Operation::AddNote { note_ref } => {
                if !self.notes.contains(note_ref) {
                    self.notes.push(note_ref.clone());
                }
            }
            Operation::RemoveNote { note_ref } => {
                self.notes.retain(|note| note != note_ref);
            }
            _ => {}
        }
    }
}

/// Fold the line into a profile state, skipping non-profile blocks
pub(crate) fn project_profile<'a>(
    line: impl IntoIterator<Item = (&'a ContentId, &'a Block)>,
) -> ProfileState {
    let mut state = ProfileState::default();
    for (_, block) in line {
        if block.kind == BlockKind::Profile {
            state.apply(&block.data);
        }
    }
    state
}

/// Fold the line into a timeline state, skipping non-timeline blocks
pub(crate) fn project_timeline<'a>(
    line: impl IntoIterator<Item = (&'a ContentId, &'a Block)>,
) -> TimelineState {
    let mut state = TimelineState::default();
    for (_, block) in line {
        if block.kind == BlockKind::Timeline {
            state.apply(&block.data);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_states_are_empty() {
        let profile = ProfileState::default();
        assert_eq!(profile.username, "");
        assert_eq!(profile.bio, "");
        assert!(profile.avatar.is_none());
        assert!(profile.following.is_empty());
        assert!(TimelineState::default().notes.is_empty());
    }

    #[test]
    fn set_operations_replace_unconditionally() {
        let mut profile = ProfileState::default();
        profile.apply(&Operation::SetUsername {
            username: "alice".into(),
        });
        profile.apply(&Operation::SetUsername {
            username: "bob".into(),
        });
        profile.apply(&Operation::SetAvatar {
            avatar: ContentId::new("bafy-pic"),
        });
        assert_eq!(profile.username, "bob");
        assert_eq!(profile.avatar, Some(ContentId::new("bafy-pic")));
    }

    #[test]
    fn add_following_is_idempotent_and_ordered() {
        let mut profile = ProfileState::default();
        profile.apply(&Operation::AddFollowing {
            following_id: Identity::new("0x1"),
        });
        profile.apply(&Operation::AddFollowing {
            following_id: Identity::new("0x2"),
        });
        profile.apply(&Operation::AddFollowing {
            following_id: Identity::new("0x1"),
        });
        assert_eq!(
            profile.following,
            vec![Identity::new("0x1"), Identity::new("0x2")]
        );
    }

    #[test]
    fn remove_following_absent_is_a_noop() {
        let mut profile = ProfileState::default();
        profile.apply(&Operation::RemoveFollowing {
            following_id: Identity::new("0x1"),
        });
        assert!(profile.following.is_empty());
    }

    #[test]
    fn remove_note_drops_all_occurrences() {
        let mut timeline = TimelineState::default();
        timeline.apply(&Operation::AddNote {
            note_ref: ContentId::new("n1"),
        });
        timeline.apply(&Operation::AddNote {
            note_ref: ContentId::new("n2"),
        });
        timeline.apply(&Operation::RemoveNote {
            note_ref: ContentId::new("n1"),
        });
        assert_eq!(timeline.notes, vec![ContentId::new("n2")]);
    }

    #[test]
    fn cross_kind_operations_do_not_leak() {
        let mut profile = ProfileState::default();
        profile.apply(&Operation::AddNote {
            note_ref: ContentId::new("n1"),
        });
        assert_eq!(profile, ProfileState::default());

        let mut timeline = TimelineState::default();
        timeline.apply(&Operation::SetBio { bio: "hi".into() });
        assert_eq!(timeline, TimelineState::default());
    }
}
