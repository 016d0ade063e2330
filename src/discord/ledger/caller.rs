use crate::core::ledger::Caller;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Build the core's view of a member: their roles and whether they hold
/// the administrator permission.
///
/// Interaction payloads carry the member's resolved permissions. A member
/// without them (e.g. from the cache) is treated as a non-administrator.
pub fn caller_from_member(member: &serenity::Member) -> Caller {
    let is_administrator = member
        .permissions
        .map(|permissions| permissions.administrator())
        .unwrap_or(false);

    Caller::new(member.roles.iter().map(|role| role.get()), is_administrator)
}

/// Resolve the invoking member of a guild command.
pub async fn caller_from_context(ctx: Context<'_>) -> Result<Caller, Error> {
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not resolve your membership in this server")?;
    Ok(caller_from_member(&member))
}
