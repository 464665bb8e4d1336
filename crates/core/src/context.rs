//! Per-batch migration context.

use serde::Serialize;
use uuid::Uuid;

use crate::dataset::DataSet;
use crate::profile::Profile;

/// Default number of raw records per batch.
pub const DEFAULT_BATCH_LIMIT: i64 = 100;

/// Maximum number of raw records per batch.
pub const MAX_BATCH_LIMIT: i64 = 1000;

/// Clamp a requested batch limit into `[1, max]`, falling back to the
/// default when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Identity and pagination window of one batch of one entity type.
///
/// Owned by the orchestrator for the duration of a batch; a fresh context
/// is built per batch and never shared across concurrently running ones.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationContext {
    pub profile: Profile,
    /// The source connection this run migrates from.
    pub connection_id: Uuid,
    /// The migration run this batch belongs to.
    pub run_id: Uuid,
    pub data_set: DataSet,
    pub offset: i64,
    pub limit: i64,
}

impl MigrationContext {
    pub fn new(
        profile: Profile,
        connection_id: Uuid,
        run_id: Uuid,
        data_set: DataSet,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Self {
        Self {
            profile,
            connection_id,
            run_id,
            data_set,
            offset: clamp_offset(offset),
            limit: clamp_limit(limit, DEFAULT_BATCH_LIMIT, MAX_BATCH_LIMIT),
        }
    }

    /// The context for the next page of the same data set.
    pub fn next_page(&self) -> Self {
        let mut next = self.clone();
        next.offset += self.limit;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::data_set_for;
    use crate::entity::EntityKind;

    fn context(offset: Option<i64>, limit: Option<i64>) -> MigrationContext {
        MigrationContext::new(
            Profile::Shop5,
            Uuid::new_v4(),
            Uuid::now_v7(),
            data_set_for(Profile::Shop5, EntityKind::Product).unwrap(),
            offset,
            limit,
        )
    }

    #[test]
    fn defaults_applied() {
        let ctx = context(None, None);
        assert_eq!(ctx.offset, 0);
        assert_eq!(ctx.limit, DEFAULT_BATCH_LIMIT);
    }

    #[test]
    fn limit_clamped_to_max() {
        let ctx = context(None, Some(50_000));
        assert_eq!(ctx.limit, MAX_BATCH_LIMIT);
    }

    #[test]
    fn limit_clamped_to_one() {
        let ctx = context(None, Some(0));
        assert_eq!(ctx.limit, 1);
    }

    #[test]
    fn negative_offset_clamped() {
        let ctx = context(Some(-5), None);
        assert_eq!(ctx.offset, 0);
    }

    #[test]
    fn next_page_advances_by_limit() {
        let ctx = context(Some(100), Some(50));
        let next = ctx.next_page();
        assert_eq!(next.offset, 150);
        assert_eq!(next.limit, 50);
        assert_eq!(next.run_id, ctx.run_id);
    }
}
