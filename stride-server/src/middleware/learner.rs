use axum::{extract::Request, middleware::Next, response::Response};
use stride_model::LearnerId;

use crate::errors::AppError;

/// Header carrying the caller's learner id. Identity is asserted by the
/// gateway in front of this service.
pub const LEARNER_ID_HEADER: &str = "x-learner-id";

/// Resolves the caller into an `Extension<LearnerId>`, rejecting requests
/// without one.
pub async fn require_learner(mut request: Request, next: Next) -> Result<Response, AppError> {
    let learner_id = learner_from_headers(&request)?;
    request.extensions_mut().insert(learner_id);
    Ok(next.run(request).await)
}

fn learner_from_headers(request: &Request) -> Result<LearnerId, AppError> {
    let raw = request
        .headers()
        .get(LEARNER_ID_HEADER)
        .ok_or_else(|| AppError::unauthorized(format!("missing {LEARNER_ID_HEADER} header")))?
        .to_str()
        .map_err(|_| AppError::unauthorized(format!("{LEARNER_ID_HEADER} is not valid text")))?;

    LearnerId::new(raw.trim())
        .map_err(|err| AppError::unauthorized(format!("invalid {LEARNER_ID_HEADER}: {err}")))
}
