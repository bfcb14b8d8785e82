use tracing::debug;
use validator::Validate;

use crate::{
    dto::action::{ActionRequest, ActionResponse},
    error::AppError,
    state::{SharedState, session::InboundAction},
};

/// Validate a relayed action and hand it to the engine.
pub async fn relay_action(
    state: &SharedState,
    mut request: ActionRequest,
) -> Result<ActionResponse, AppError> {
    request.validate()?;

    let token = request.interaction_token();
    request.token = Some(token.clone());
    let action = InboundAction::from(request);
    debug!(
        scope = %action.scope,
        action_id = %action.action_id,
        participant = %action.actor.id,
        "relaying action"
    );

    let outcome = state.engine().handle_action(action).await;
    Ok(ActionResponse::new(token, outcome))
}
