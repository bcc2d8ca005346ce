use std::collections::HashSet;

use super::super::domain::{LotId, MatchCandidate, NeedId};

/// Candidates accepted so far in one run, plus the lots and needs they spoke for.
pub(crate) struct ClaimSet {
    limit: usize,
    lots: HashSet<LotId>,
    needs: HashSet<NeedId>,
    candidates: Vec<MatchCandidate>,
}

impl ClaimSet {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            lots: HashSet::new(),
            needs: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.candidates.len() >= self.limit
    }

    pub(crate) fn lot_claimed(&self, id: &LotId) -> bool {
        self.lots.contains(id)
    }

    pub(crate) fn need_claimed(&self, id: &NeedId) -> bool {
        self.needs.contains(id)
    }

    /// Accept `candidate` unless the run is full or either side is taken.
    pub(crate) fn claim(&mut self, candidate: MatchCandidate) -> bool {
        if self.is_full()
            || candidate.quantity == 0
            || self.lot_claimed(&candidate.lot_id)
            || self.need_claimed(&candidate.need_id)
        {
            return false;
        }

        self.lots.insert(candidate.lot_id.clone());
        self.needs.insert(candidate.need_id.clone());
        self.candidates.push(candidate);
        true
    }

    pub(crate) fn into_candidates(self) -> Vec<MatchCandidate> {
        self.candidates
    }
}
