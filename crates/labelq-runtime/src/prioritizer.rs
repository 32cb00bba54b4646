//! Active-group prioritizer
//!
//! Before a labeled scan, active groups are pulled to the front of the
//! scan by relinking them just before the ring cursor. Each promotion buys
//! `promotion_credit` turns; every group the scan visits spends one. Only
//! when the credit is spent (≤ 0) are active groups promoted again, so
//! background groups always get their round-robin turn in between.
//!
//! An active group already sitting at the cursor is not moved, but it is
//! about to be served all the same and is charged like a promotion.

use labelq_core::kdebug;

use crate::context::SchedulerContext;

#[derive(Debug)]
pub struct ActivePrioritizer {
    starvation_credit: i32,
    promotion_credit: i32,
}

impl ActivePrioritizer {
    pub fn new(promotion_credit: i32) -> Self {
        Self { starvation_credit: 0, promotion_credit }
    }

    /// Remaining credit; promotion is suppressed while this is positive
    #[inline]
    pub fn starvation_credit(&self) -> i32 {
        self.starvation_credit
    }

    /// Rotate active groups in front of the cursor if the credit allows.
    /// Returns the number of groups relocated.
    pub fn promote(&mut self, ctx: &mut SchedulerContext) -> usize {
        if ctx.active.is_empty() || self.starvation_credit > 0 {
            return 0;
        }
        // Skipped groups may have driven the credit far below zero; a
        // promotion always buys its full credit
        self.starvation_credit = self.starvation_credit.max(0);

        let mut moved = 0;
        for i in 0..ctx.active.len() {
            let group = ctx.active[i];
            let Some(cursor) = ctx.cursor else { break };
            if !ctx.ring.contains(&ctx.groups, group) {
                continue;
            }

            if group != cursor {
                ctx.ring.remove(&mut ctx.groups, group);
                ctx.ring.insert_before(&mut ctx.groups, cursor, group);
                ctx.cursor = Some(group);
                moved += 1;
            }
            self.starvation_credit += self.promotion_credit;
        }

        if moved > 0 {
            kdebug!(
                "promoted {} active group(s), starvation credit {}",
                moved,
                self.starvation_credit
            );
        }
        moved
    }

    /// Spend one turn for a group visited by the scan
    #[inline]
    pub fn visit(&mut self) {
        self.starvation_credit -= 1;
    }

    pub fn reset(&mut self) {
        self.starvation_credit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use labelq_core::id::GroupId;

    fn ring_with(n: usize) -> (SchedulerContext, Vec<GroupId>) {
        let mut ctx = SchedulerContext::new(&QueueConfig::new().max_groups(16));
        let ids: Vec<_> = (0..n).map(|_| ctx.register_group().unwrap()).collect();
        for &id in &ids {
            ctx.count_in(id);
        }
        (ctx, ids)
    }

    #[test]
    fn test_no_active_no_change() {
        let (mut ctx, g) = ring_with(3);
        let mut p = ActivePrioritizer::new(2);
        assert_eq!(p.promote(&mut ctx), 0);
        assert_eq!(ctx.ring_order(), g);
        assert_eq!(ctx.cursor(), Some(g[0]));
    }

    #[test]
    fn test_promotes_before_cursor() {
        let (mut ctx, g) = ring_with(4);
        ctx.set_active(g[2], true).unwrap();
        let mut p = ActivePrioritizer::new(2);

        assert_eq!(p.promote(&mut ctx), 1);
        assert_eq!(ctx.ring_order(), vec![g[2], g[0], g[1], g[3]]);
        assert_eq!(ctx.cursor(), Some(g[2]));
        assert_eq!(p.starvation_credit(), 2);
        assert!(ctx.verify().is_ok());

        // Credit positive: no further promotion
        ctx.set_active(g[3], true).unwrap();
        assert_eq!(p.promote(&mut ctx), 0);
    }

    #[test]
    fn test_multiple_active_last_wins_cursor() {
        let (mut ctx, g) = ring_with(4);
        ctx.set_active(g[2], true).unwrap();
        ctx.set_active(g[3], true).unwrap();
        let mut p = ActivePrioritizer::new(2);

        assert_eq!(p.promote(&mut ctx), 2);
        assert_eq!(ctx.ring_order(), vec![g[3], g[2], g[0], g[1]]);
        assert_eq!(ctx.cursor(), Some(g[3]));
        assert_eq!(p.starvation_credit(), 4);
    }

    #[test]
    fn test_cursor_group_charged_not_moved() {
        let (mut ctx, g) = ring_with(2);
        let idle = ctx.register_group().unwrap();
        ctx.set_active(g[0], true).unwrap();
        ctx.set_active(idle, true).unwrap();
        let mut p = ActivePrioritizer::new(2);

        // g0 is already the cursor; idle has nothing queued
        assert_eq!(p.promote(&mut ctx), 0);
        assert_eq!(ctx.ring_order(), g);
        assert_eq!(p.starvation_credit(), 2);
    }

    #[test]
    fn test_credit_rearms_after_visits() {
        let (mut ctx, g) = ring_with(3);
        ctx.set_active(g[1], true).unwrap();
        let mut p = ActivePrioritizer::new(2);

        assert_eq!(p.promote(&mut ctx), 1);
        p.visit();
        assert_eq!(p.promote(&mut ctx), 0);
        p.visit();
        assert_eq!(p.starvation_credit(), 0);

        // Move the cursor off the active group; promotion is armed again
        ctx.advance_cursor(g[1]);
        assert_eq!(p.promote(&mut ctx), 1);
        assert_eq!(ctx.cursor(), Some(g[1]));
    }

    #[test]
    fn test_debt_does_not_carry_into_promotion() {
        let (mut ctx, g) = ring_with(3);
        ctx.set_active(g[2], true).unwrap();
        let mut p = ActivePrioritizer::new(2);

        for _ in 0..5 {
            p.visit();
        }
        assert_eq!(p.starvation_credit(), -5);
        assert_eq!(p.promote(&mut ctx), 1);
        assert_eq!(p.starvation_credit(), 2);
    }
}
