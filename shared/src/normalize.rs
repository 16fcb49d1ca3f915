use thiserror::Error;

use crate::{RouteResult, RouteSummary, sanitize::strip_markup};

/// Plain-text turn-by-turn instructions, leg order then step order.
pub type InstructionList = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("invalid route result: {0}")]
    InvalidRouteResult(&'static str),
}

/// Derives the distance/duration summary and the flat instruction list from
/// the first route of a routing response.
///
/// The summary is read verbatim from the first leg. Instructions cover every
/// step of every leg of that route and are never filtered or reordered.
pub fn normalize(result: &RouteResult) -> Result<(RouteSummary, InstructionList), NormalizeError> {
    let route = result
        .primary()
        .ok_or(NormalizeError::InvalidRouteResult("no routes"))?;
    let first_leg = route
        .legs
        .first()
        .ok_or(NormalizeError::InvalidRouteResult("route has no legs"))?;

    let summary = RouteSummary {
        distance_text: first_leg.distance.text.clone(),
        duration_text: first_leg.duration.text.clone(),
    };

    let instructions = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| strip_markup(&step.instruction_html))
        .collect();

    Ok((summary, instructions))
}
