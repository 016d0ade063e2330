// Discord commands for the guild currency.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call the ledger service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::ledger::{Holder, LedgerError, LedgerService};
use crate::discord::ledger::caller_from_context;
use crate::discord::ledger::manage_buttons::manage_buttons;
use crate::infra::ledger::JsonLedgerStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub ledger: Arc<LedgerService<JsonLedgerStore>>,
    /// Invite link to the support server, shown on /help and mention replies.
    pub support_url: Option<String>,
}

pub const BRAND_GREEN: u32 = 0x57F287;
const NO_PERMISSION: &str = "你沒有權限使用這個指令。";
const HOLDERS_PER_PAGE: usize = 10;

/// 顯示與管理使用者的餘額。
#[poise::command(slash_command, guild_only)]
pub async fn balance(
    ctx: Context<'_>,
    #[description = "要顯示的使用者。"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    let user_id = target_user.id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.defer().await?;

    let (balance, currency_name) = ctx.data().ledger.get_balance(guild_id, user_id).await?;

    let embed = serenity::CreateEmbed::new()
        .title("查詢餘額")
        .description(format!(
            "<@{}> 擁有 {} {}。",
            user_id, balance, currency_name
        ))
        .color(BRAND_GREEN)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "使用者ID: {}",
            user_id
        )));

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .components(vec![manage_buttons(user_id)]),
    )
    .await?;

    Ok(())
}

/// 設定伺服器的貨幣名稱。
#[poise::command(slash_command, guild_only, ephemeral, rename = "set-name")]
pub async fn set_name(
    ctx: Context<'_>,
    #[description = "要設定的貨幣名稱。"] name: String,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let caller = caller_from_context(ctx).await?;

    match ctx
        .data()
        .ledger
        .set_currency_name(guild_id, name.clone(), &caller)
        .await
    {
        Ok(()) => {
            tracing::info!(guild_id, "Currency renamed");
            ctx.say(format!("已將貨幣名稱設置為 {}。", name)).await?;
        }
        Err(LedgerError::Forbidden) => {
            ctx.say(NO_PERMISSION).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// 設定管理員身分組。
#[poise::command(slash_command, guild_only, ephemeral, rename = "set-admin")]
pub async fn set_admin(
    ctx: Context<'_>,
    #[description = "要設定的管理員身分組。"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let caller = caller_from_context(ctx).await?;
    let role_id = role.id.get();

    match ctx
        .data()
        .ledger
        .set_admin_role(guild_id, role_id, &caller)
        .await
    {
        Ok(()) => {
            tracing::info!(guild_id, role_id, "Admin role assigned");
            ctx.say(format!(
                "已將管理員身分組設置為 <@&{}>。擁有該身分組的使用者可以使用餘額管理按鈕。",
                role_id
            ))
            .await?;
        }
        Err(LedgerError::Forbidden) => {
            ctx.say(NO_PERMISSION).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// 列出這個伺服器所有使用者的餘額。
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.defer_ephemeral().await?;

    let (holders, currency_name) = ctx.data().ledger.list_holders(guild_id).await?;

    if holders.is_empty() {
        ctx.say(format!("這個伺服器沒有任何使用者擁有{}。", currency_name))
            .await?;
        return Ok(());
    }

    let total_pages = page_count(holders.len());
    let mut current_page = 1;

    let embed = build_holder_page(ctx, &holders, &currency_name, current_page).await;
    let mut reply = poise::CreateReply::default().embed(embed);
    if total_pages > 1 {
        reply = reply.components(vec![page_buttons(current_page, total_pages)]);
    }
    let msg = ctx.send(reply).await?;

    if total_pages == 1 {
        return Ok(());
    }

    let msg_id = msg.message().await?.id;

    // Interaction loop
    while let Some(mci) = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(std::time::Duration::from_secs(60 * 2)) // 2 minutes
        .filter(move |mci| mci.message.id == msg_id)
        .await
    {
        match mci.data.custom_id.as_str() {
            "list_prev" => current_page = current_page.saturating_sub(1).max(1),
            "list_next" => current_page = (current_page + 1).min(total_pages),
            _ => continue,
        }

        // Defer the update to prevent "Unknown interaction" errors if name lookups are slow
        if let Err(e) = mci.defer(&ctx.http()).await {
            tracing::warn!("Error deferring list interaction: {:?}", e);
            continue;
        }

        let embed = build_holder_page(ctx, &holders, &currency_name, current_page).await;
        if let Err(e) = msg
            .edit(
                ctx,
                poise::CreateReply::default()
                    .embed(embed)
                    .components(vec![page_buttons(current_page, total_pages)]),
            )
            .await
        {
            tracing::warn!("Error updating holder list: {:?}", e);
        }
    }

    // Remove components after timeout
    let _ = msg
        .edit(ctx, poise::CreateReply::default().components(vec![]))
        .await;

    Ok(())
}

fn page_count(holders: usize) -> usize {
    holders.div_ceil(HOLDERS_PER_PAGE).max(1)
}

/// Medal for the podium, plain number otherwise.
fn placement_label(place: usize) -> String {
    match place {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        _ => place.to_string(),
    }
}

async fn build_holder_page(
    ctx: Context<'_>,
    holders: &[Holder],
    currency_name: &str,
    page: usize,
) -> serenity::CreateEmbed {
    let offset = (page - 1) * HOLDERS_PER_PAGE;
    let mut embed = serenity::CreateEmbed::new()
        .title("使用者餘額列表")
        .description(format!(
            "這個伺服器共有 {} 名使用者擁有{}。",
            holders.len(),
            currency_name
        ))
        .color(BRAND_GREEN)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "第 {}/{} 頁",
            page,
            page_count(holders.len())
        )));

    for (index, holder) in holders
        .iter()
        .skip(offset)
        .take(HOLDERS_PER_PAGE)
        .enumerate()
    {
        let place = offset + index + 1;
        let name = resolve_user_name(ctx, holder.user_id).await;
        embed = embed.field(
            format!("{} - {}", placement_label(place), name),
            format!("餘額：{} {}", holder.balance, currency_name),
            false,
        );
    }

    embed
}

fn page_buttons(current_page: usize, total_pages: usize) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new("list_prev")
            .label("◀ 上一頁")
            .style(serenity::ButtonStyle::Primary)
            .disabled(current_page == 1),
        serenity::CreateButton::new("list_next")
            .label("下一頁 ▶")
            .style(serenity::ButtonStyle::Primary)
            .disabled(current_page == total_pages),
    ])
}

/// Cache first, then the API, then the raw ID.
async fn resolve_user_name(ctx: Context<'_>, user_id: u64) -> String {
    let user_id_s = serenity::UserId::new(user_id);

    if let Some(user) = ctx.serenity_context().cache.user(user_id_s) {
        return user.name.clone();
    }

    match ctx.http().get_user(user_id_s).await {
        Ok(user) => user.name,
        Err(_) => user_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(25), 3);
    }

    #[test]
    fn test_placement_label() {
        assert_eq!(placement_label(1), "🥇");
        assert_eq!(placement_label(3), "🥉");
        assert_eq!(placement_label(4), "4");
        assert_eq!(placement_label(12), "12");
    }
}
