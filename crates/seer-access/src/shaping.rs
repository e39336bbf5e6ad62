//! Tier-sensitive query shaping for "largest transactions" queries.
//!
//! Enforced centrally, before the query reaches the data provider -
//! presentation code never sees the caller's original values.

use crate::tier::Tier;

/// Maximum results a free-tier caller can request.
pub const FREE_TIER_MAX_RESULTS: usize = 3;

/// Pagination shape of a transactions query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    /// Maximum number of records to return
    pub limit: usize,
    /// Pagination offset into the result set
    pub offset: usize,
    /// For weekly variants: weeks back from the current week
    pub week_offset: usize,
}

impl QueryShape {
    /// Create a shape from caller-supplied values.
    pub fn new(limit: usize, offset: usize, week_offset: usize) -> Self {
        Self {
            limit,
            offset,
            week_offset,
        }
    }

    /// Apply tier restrictions. Free tier: at most
    /// [`FREE_TIER_MAX_RESULTS`] results, no pagination, current week
    /// only. Other tiers pass through unchanged.
    pub fn clamp_for_tier(self, tier: Tier) -> Self {
        if tier != Tier::Free {
            return self;
        }
        Self {
            limit: self.limit.min(FREE_TIER_MAX_RESULTS),
            offset: 0,
            week_offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_is_clamped() {
        let shaped = QueryShape::new(100, 20, 3).clamp_for_tier(Tier::Free);
        assert_eq!(shaped, QueryShape::new(3, 0, 0));
    }

    #[test]
    fn free_tier_small_limit_is_kept() {
        let shaped = QueryShape::new(2, 0, 0).clamp_for_tier(Tier::Free);
        assert_eq!(shaped.limit, 2);
    }

    #[test]
    fn paid_tiers_pass_through() {
        let shape = QueryShape::new(100, 20, 3);
        assert_eq!(shape.clamp_for_tier(Tier::Premium), shape);
        assert_eq!(shape.clamp_for_tier(Tier::Pro), shape);
    }
}
