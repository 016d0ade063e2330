// General-purpose commands: invite link, bot info and the command list.
// Also builds the intro card the bot posts when someone mentions it.

use crate::discord::commands::economy::BRAND_GREEN;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const SUPPORT_FOOTER: &str = "如果在使用上有任何問題，歡迎加入支援伺服器請求協助。";

/// OAuth2 invite URL with the permissions the bot needs (send messages, embed links).
pub fn invite_url(bot_id: serenity::UserId) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={}&permissions=67584&scope=bot%20applications.commands",
        bot_id
    )
}

/// Invite button, plus a support server button when one is configured.
fn link_buttons(bot_id: serenity::UserId, support_url: Option<&str>) -> serenity::CreateActionRow {
    let mut buttons = vec![serenity::CreateButton::new_link(invite_url(bot_id)).label("邀請連結")];
    if let Some(url) = support_url {
        buttons.push(serenity::CreateButton::new_link(url).label("支援伺服器"));
    }
    serenity::CreateActionRow::Buttons(buttons)
}

/// Reply posted when the bot is mentioned in a channel.
pub fn build_intro_message(
    bot_id: serenity::UserId,
    avatar_url: String,
    support_url: Option<&str>,
) -> serenity::CreateMessage {
    let embed = serenity::CreateEmbed::new()
        .title("感謝選用錢叡")
        .description(
            "錢叡是一個富含創意易於使用的錢包機器人。\n\
             他可以幫助你管理伺服器的經濟。\n\
             你可以使用 `/help` 來查看指令列表。",
        )
        .color(BRAND_GREEN)
        .thumbnail(avatar_url)
        .footer(serenity::CreateEmbedFooter::new(SUPPORT_FOOTER));

    serenity::CreateMessage::new()
        .embed(embed)
        .components(vec![link_buttons(bot_id, support_url)])
}

/// 邀請機器人至你的伺服器。
#[poise::command(slash_command)]
pub async fn invite(ctx: Context<'_>) -> Result<(), Error> {
    let bot_id = ctx.serenity_context().cache.current_user().id;

    let embed = serenity::CreateEmbed::new()
        .title("邀請機器人")
        .description("點擊下方的按鈕來邀請機器人至你的伺服器。")
        .color(BRAND_GREEN);

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .components(vec![link_buttons(bot_id, None)]),
    )
    .await?;
    Ok(())
}

/// 顯示機器人的資訊。
#[poise::command(slash_command, guild_only)]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let versions = format!(
        "機器人: **{}**\nRust 框架: **poise 0.6 / serenity 0.12**",
        env!("CARGO_PKG_VERSION")
    );

    // Collect counts before awaiting anything so no cache guard is held across an await.
    let (guild_count, channel_count) = {
        let cache = &ctx.serenity_context().cache;
        let guild_ids = cache.guilds();
        let channels: usize = guild_ids
            .iter()
            .filter_map(|id| cache.guild(*id).map(|guild| guild.channels.len()))
            .sum();
        (guild_ids.len(), channels)
    };

    let shard_id = ctx.serenity_context().shard_id;
    let latency = ctx.ping().await;

    let embed = serenity::CreateEmbed::new()
        .title("機器人資訊")
        .description("一個富含創意易於使用的錢包機器人，管理員可以透過指令查詢與管理使用者的餘額。")
        .color(BRAND_GREEN)
        .field("📒 版本", versions, false)
        .field(
            "📊 數據",
            format!(
                "正在服務 **{}** 個伺服器，共 **{}** 個頻道。",
                guild_count, channel_count
            ),
            false,
        )
        .field(
            "📈 狀態",
            format!(
                "目前伺服器所在分片: 分片 **{}**\n分片延遲: **{:.2}**ms",
                shard_id.0,
                latency.as_secs_f64() * 1000.0
            ),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// 顯示機器人的指令列表。
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let (bot_id, avatar_url) = {
        let me = ctx.serenity_context().cache.current_user();
        (me.id, me.face())
    };

    let embed = serenity::CreateEmbed::new()
        .title("幫助訊息")
        .description("一個富含創意易於使用的錢包機器人。")
        .color(BRAND_GREEN)
        .field(
            "💰 錢包",
            "`/balance` - 查詢使用者的餘額。\n\
             `/list` - 查詢伺服器所有使用者的餘額。",
            false,
        )
        .field(
            "🔧 管理員設定",
            "`/set-name` - 設定伺服器貨幣的名稱。\n\
             `/set-admin` - 設定伺服器的管理員身分組。",
            false,
        )
        .field(
            "💡 雜項",
            "`/info` - 顯示機器人的資訊。\n\
             `/invite` - 邀請機器人至你的伺服器。\n\
             `/help` - 顯示機器人的指令列表。",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(SUPPORT_FOOTER))
        .thumbnail(avatar_url);

    let support_url = ctx.data().support_url.as_deref();
    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .components(vec![link_buttons(bot_id, support_url)]),
    )
    .await?;
    Ok(())
}
