//! Composed audit metadata for aggregates.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

/// Who created/last touched an aggregate, and when.
///
/// Attached to aggregates as a plain value; the acting user is always
/// supplied explicitly by the calling layer, never resolved from ambient
/// session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    /// Creates a stamp for a freshly created aggregate.
    pub fn new(actor: UserId) -> Self {
        let now = Utc::now();
        Self {
            created_by: actor,
            created_at: now,
            updated_by: actor,
            updated_at: now,
        }
    }

    /// Records a mutation by the given actor.
    pub fn touch(&mut self, actor: UserId) {
        self.updated_by = actor;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stamp_has_matching_created_and_updated() {
        let actor = UserId::new();
        let stamp = AuditStamp::new(actor);
        assert_eq!(stamp.created_by, actor);
        assert_eq!(stamp.updated_by, actor);
        assert_eq!(stamp.created_at, stamp.updated_at);
    }

    #[test]
    fn touch_updates_actor_and_time() {
        let creator = UserId::new();
        let mut stamp = AuditStamp::new(creator);

        let editor = UserId::new();
        stamp.touch(editor);

        assert_eq!(stamp.created_by, creator);
        assert_eq!(stamp.updated_by, editor);
        assert!(stamp.updated_at >= stamp.created_at);
    }
}
