//! Tracking of nested length-prefixed constructs.
use crate::error::{
    MilestoneOrderSnafu, MilestoneOutsideParentSnafu, MilestoneUnderflowSnafu, Result,
};
use snafu::{ensure, OptionExt};

/// A handle to a pushed milestone,
/// to be handed back when popping it.
///
/// Holding the handle ties the pop to the push,
/// so that milestones are only ever popped in reverse order.
#[must_use = "milestones must be popped by whoever pushed them"]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Milestone {
    offset: u64,
    depth: usize,
}

impl Milestone {
    /// The absolute offset at which the construct ends.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The number of milestones in the stack once this one was pushed.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// A stack of absolute offsets,
/// each marking the end of a construct being read.
///
/// A construct must lie inside the one enclosing it,
/// so offsets never increase from the bottom to the top of the stack.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Milestones(Vec<u64>);

impl Milestones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the end offset of a new innermost construct.
    pub fn push(&mut self, offset: u64) -> Result<Milestone> {
        if let Some(&parent) = self.0.last() {
            ensure!(
                offset <= parent,
                MilestoneOutsideParentSnafu { offset, parent }
            );
        }
        self.0.push(offset);
        Ok(Milestone {
            offset,
            depth: self.0.len(),
        })
    }

    /// Pop the innermost milestone,
    /// which must be the one given.
    pub fn pop(&mut self, milestone: Milestone) -> Result<()> {
        let top = *self.0.last().context(MilestoneUnderflowSnafu)?;
        ensure!(
            milestone.depth == self.0.len() && milestone.offset == top,
            MilestoneOrderSnafu {
                offset: milestone.offset,
                top
            }
        );
        self.0.pop();
        Ok(())
    }

    /// The end offset of the innermost construct.
    pub fn top(&self) -> Option<u64> {
        self.0.last().copied()
    }

    /// Whether the given position is at or past the innermost milestone.
    /// Always `false` when there are no milestones.
    pub fn reached(&self, position: u64) -> bool {
        self.top().map(|top| position >= top).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn nested_push_pop() {
        let mut m = Milestones::new();
        assert!(!m.reached(1000));
        let outer = m.push(100).unwrap();
        let inner = m.push(60).unwrap();
        assert_eq!(m.len(), 2);
        assert!(!m.reached(59));
        assert!(m.reached(60));
        m.pop(inner).unwrap();
        assert!(!m.reached(60));
        m.pop(outer).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn out_of_order_pop_fails() {
        let mut m = Milestones::new();
        let outer = m.push(100).unwrap();
        let inner = m.push(60).unwrap();
        assert!(matches!(m.pop(outer), Err(Error::MilestoneOrder { .. })));
        m.pop(inner).unwrap();
        m.pop(outer).unwrap();
        assert!(matches!(m.pop(outer), Err(Error::MilestoneUnderflow { .. })));
    }

    #[test]
    fn equal_offsets_are_told_apart() {
        let mut m = Milestones::new();
        let outer = m.push(50).unwrap();
        let inner = m.push(50).unwrap();
        assert!(m.pop(outer).is_err());
        m.pop(inner).unwrap();
        m.pop(outer).unwrap();
    }

    #[test]
    fn inner_must_not_exceed_outer() {
        let mut m = Milestones::new();
        let _outer = m.push(100).unwrap();
        assert!(matches!(
            m.push(101),
            Err(Error::MilestoneOutsideParent {
                offset: 101,
                parent: 100,
                ..
            })
        ));
        assert_eq!(m.len(), 1);
    }
}
