//! Pick one couplet out of the candidate history once the couplet budget is
//! spent.
//!
//! Only length-compliant pairs are eligible. With none, the first raw
//! candidate is returned so the caller can decide what to do with it; with
//! exactly one, no model call is made.

use chunlian_core::provider::ChatCompletionProvider;
use chunlian_types::{couplet::CoupletCandidate, prompts::CoupletContext, workflow::ElectionSummary};
use thiserror::Error;

use crate::generators::StageGenerators;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("no candidates to elect from")]
    NoCandidates,
    #[error("selected index {selected} is outside 1..={count}")]
    IndexOutOfRange { selected: i64, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Election {
    pub upper_line: String,
    pub lower_line: String,
    /// Position in the candidate list passed to [`elect`].
    pub selected_index: usize,
    pub reason: String,
}

impl Election {
    fn of(candidates: &[CoupletCandidate], index: usize, reason: impl Into<String>) -> Self {
        let winner = &candidates[index];
        Self {
            upper_line: winner.upper_line.clone(),
            lower_line: winner.lower_line.clone(),
            selected_index: index,
            reason: reason.into(),
        }
    }

    pub fn summary(&self, candidate_count: usize) -> ElectionSummary {
        ElectionSummary {
            selected_index: self.selected_index,
            reason: self.reason.clone(),
            candidate_count,
        }
    }
}

/// Map the model's 1-based answer onto a 0-based position among `count`
/// enumerated candidates.
pub fn resolve_choice(selected: i64, count: usize) -> Result<usize, ElectionError> {
    usize::try_from(selected)
        .ok()
        .filter(|i| (1..=count).contains(i))
        .map(|i| i - 1)
        .ok_or(ElectionError::IndexOutOfRange { selected, count })
}

pub async fn elect<B>(
    generators: &StageGenerators<B>,
    ctx: CoupletContext<'_>,
    candidates: &[CoupletCandidate],
) -> Result<Election, ElectionError>
where
    B: ChatCompletionProvider,
{
    if candidates.is_empty() {
        return Err(ElectionError::NoCandidates);
    }

    let qualifying: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_length_compliant(ctx.length))
        .map(|(i, _)| i)
        .collect();

    match qualifying.as_slice() {
        [] => Ok(Election::of(
            candidates,
            0,
            "no length-compliant candidate; defaulted to first",
        )),
        [only] => Ok(Election::of(candidates, *only, "only length-compliant candidate")),
        many => {
            let enumerated: Vec<&CoupletCandidate> = many.iter().map(|&i| &candidates[i]).collect();
            let choice = generators
                .compare(ctx, &enumerated)
                .await
                .map_err(|err| err.to_string())
                .and_then(|choice| {
                    resolve_choice(choice.selected_index, many.len())
                        .map(|pos| (pos, choice.reason))
                        .map_err(|err| err.to_string())
                });

            match choice {
                Ok((pos, reason)) => Ok(Election::of(candidates, many[pos], reason)),
                Err(err) => {
                    tracing::warn!(error = %err, "election comparison unusable, taking first qualifying candidate");
                    Ok(Election::of(
                        candidates,
                        many[0],
                        format!("comparison failed ({err}); defaulted to first qualifying candidate"),
                    ))
                }
            }
        }
    }
}
