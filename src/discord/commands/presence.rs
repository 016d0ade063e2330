// Bot presence.
//
// Discord-layer glue only: we work with SDK types (Context, ActivityData,
// OnlineStatus) and keep it short.

use poise::serenity_prelude as serenity;

const DEFAULT_ACTIVITY: &str = "錢錢💰";

/// Called once the bot is ready so every shard shows the default activity.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::playing(DEFAULT_ACTIVITY);
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
