use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_meta::{MetaTaskRegistry, ScoringContext, SettlementTask};
use outpost_settlement::Settlement;
use outpost_types::{RatingScore, Worker};

/// A worker handed a candidate during a pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker_id: Uuid,
    pub task_id: Uuid,
    pub meta_task: String,
    pub building_id: Uuid,
    pub score: f64,
}

/// Orders two scored candidates: higher score first, then earlier
/// registration, then lower building id.
fn rank(
    registry: &MetaTaskRegistry,
    (a, a_score): (&SettlementTask, &RatingScore),
    (b, b_score): (&SettlementTask, &RatingScore),
) -> Ordering {
    let position = |c: &SettlementTask| registry.position(&c.meta.name).unwrap_or(usize::MAX);
    b_score
        .cmp_score(a_score)
        .then_with(|| position(a).cmp(&position(b)))
        .then_with(|| a.building_id.cmp(&b.building_id))
}

/// Pick the best candidate for a worker.
///
/// Candidates with no demand left or a zero score are never chosen.
/// Returns the candidate's index and the worker's score for it.
pub fn select_candidate(
    registry: &MetaTaskRegistry,
    candidates: &[SettlementTask],
    worker: &Worker,
    settlement: &Settlement,
    ctx: &ScoringContext,
) -> Option<(usize, RatingScore)> {
    let mut best: Option<(usize, RatingScore)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        if candidate.demand == 0 {
            continue;
        }
        let score = candidate
            .meta
            .assess_suitability(candidate, worker, settlement, ctx);
        if score.is_zero() {
            continue;
        }
        tracing::debug!(
            worker = %worker.name,
            candidate = %candidate.description,
            %score,
            "candidate scored"
        );
        let better = match &best {
            None => true,
            Some((best_idx, best_score)) => {
                rank(
                    registry,
                    (candidate, &score),
                    (&candidates[*best_idx], best_score),
                ) == Ordering::Less
            }
        };
        if better {
            best = Some((idx, score));
        }
    }
    best
}
