// Credit/debit buttons attached to the /balance embed.
//
// The buttons carry the target user in their custom ID, so they keep working
// after a restart without any in-process state. The flow is:
// 1. Button click -> authorization check -> amount modal (or a "no permission" reply)
// 2. Modal submit -> parse amount -> LedgerService::adjust_balance -> ephemeral reply

use crate::core::ledger::LedgerError;
use crate::discord::ledger::caller_from_member;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub const NO_PERMISSION_BUTTON: &str = "你沒有權限使用這個按鈕。";
const INVALID_AMOUNT: &str = "請輸入大於0的整數。";
const OUT_OF_RANGE: &str = "餘額超出可儲存的範圍。";
const STORAGE_FAILED: &str = "儲存資料時發生錯誤，請稍後再試。";

const AMOUNT_INPUT_ID: &str = "amount";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Credit,
    Debit,
}

impl Direction {
    fn button_prefix(self) -> &'static str {
        match self {
            Direction::Credit => "ledger_add",
            Direction::Debit => "ledger_sub",
        }
    }

    fn modal_prefix(self) -> &'static str {
        match self {
            Direction::Credit => "ledger_add_modal",
            Direction::Debit => "ledger_sub_modal",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Direction::Credit => "增加餘額",
            Direction::Debit => "減少餘額",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Direction::Credit => "請輸入要增加的數量",
            Direction::Debit => "請輸入要減少的數量",
        }
    }

    fn signed(self, amount: i64) -> i64 {
        match self {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        }
    }

    fn from_button_id(custom_id: &str) -> Option<(Self, u64)> {
        [Direction::Credit, Direction::Debit]
            .into_iter()
            .find_map(|direction| {
                parse_target(custom_id, direction.button_prefix()).map(|user| (direction, user))
            })
    }

    fn from_modal_id(custom_id: &str) -> Option<(Self, u64)> {
        [Direction::Credit, Direction::Debit]
            .into_iter()
            .find_map(|direction| {
                parse_target(custom_id, direction.modal_prefix()).map(|user| (direction, user))
            })
    }
}

/// `"<prefix>:<user_id>"` -> user_id
fn parse_target(custom_id: &str, prefix: &str) -> Option<u64> {
    custom_id
        .strip_prefix(prefix)?
        .strip_prefix(':')?
        .parse()
        .ok()
}

/// Parse what a member typed into the amount box.
///
/// Only plain ASCII digits are accepted, the value must be above zero and
/// fit in an i64. Signs are decided by which button was pressed.
pub fn parse_amount(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok().filter(|amount| *amount > 0)
}

/// The action row shown under a balance embed.
pub fn manage_buttons(user_id: u64) -> serenity::CreateActionRow {
    let button = |direction: Direction| {
        serenity::CreateButton::new(format!("{}:{}", direction.button_prefix(), user_id))
            .label(direction.label())
            .style(serenity::ButtonStyle::Success)
    };

    serenity::CreateActionRow::Buttons(vec![button(Direction::Credit), button(Direction::Debit)])
}

/// Entry point from the event handler. Ignores interactions that aren't ours.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(mci) => {
            if let Some((direction, user_id)) = Direction::from_button_id(&mci.data.custom_id) {
                open_amount_modal(ctx, mci, data, direction, user_id).await?;
            }
        }
        serenity::Interaction::Modal(modal) => {
            if let Some((direction, user_id)) = Direction::from_modal_id(&modal.data.custom_id) {
                apply_amount(ctx, modal, data, direction, user_id).await?;
            }
        }
        _ => {}
    }
    Ok(())
}

async fn open_amount_modal(
    ctx: &serenity::Context,
    mci: &serenity::ComponentInteraction,
    data: &Data,
    direction: Direction,
    user_id: u64,
) -> Result<(), Error> {
    let Some(guild_id) = mci.guild_id else {
        return Ok(());
    };
    let caller = mci
        .member
        .as_ref()
        .map(caller_from_member)
        .unwrap_or_default();

    match data.ledger.check_manage(guild_id.get(), &caller).await {
        Ok(()) => {}
        Err(LedgerError::Forbidden) => {
            return reply_ephemeral(ctx, mci, NO_PERMISSION_BUTTON).await;
        }
        Err(e) => {
            tracing::error!("Failed to load ledger for button check: {}", e);
            return reply_ephemeral(ctx, mci, STORAGE_FAILED).await;
        }
    }

    let input = serenity::CreateInputText::new(
        serenity::InputTextStyle::Short,
        "數量",
        AMOUNT_INPUT_ID,
    )
    .placeholder(direction.placeholder())
    .required(true);

    let modal = serenity::CreateModal::new(
        format!("{}:{}", direction.modal_prefix(), user_id),
        direction.label(),
    )
    .components(vec![serenity::CreateActionRow::InputText(input)]);

    mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

async fn apply_amount(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &Data,
    direction: Direction,
    user_id: u64,
) -> Result<(), Error> {
    let Some(guild_id) = modal.guild_id else {
        return Ok(());
    };

    let Some(amount) = submitted_text(modal).as_deref().and_then(parse_amount) else {
        return reply_ephemeral_modal(ctx, modal, INVALID_AMOUNT).await;
    };

    let caller = modal
        .member
        .as_ref()
        .map(caller_from_member)
        .unwrap_or_default();

    let content = match data
        .ledger
        .adjust_balance(guild_id.get(), user_id, direction.signed(amount), &caller)
        .await
    {
        Ok(update) => {
            let name = update.currency_name;
            match direction {
                Direction::Credit => format!(
                    "已為 <@{}> 增加了 {} {}。他們現在擁有 {} {}。",
                    user_id, amount, name, update.new_balance, name
                ),
                Direction::Debit => format!(
                    "已從 <@{}> 減少了 {} {}。他們現在擁有 {} {}。",
                    user_id, amount, name, update.new_balance, name
                ),
            }
        }
        Err(LedgerError::Forbidden) => NO_PERMISSION_BUTTON.to_string(),
        Err(LedgerError::InvalidInput(reason)) => {
            tracing::debug!(guild_id = guild_id.get(), user_id, "Rejected adjustment: {}", reason);
            OUT_OF_RANGE.to_string()
        }
        Err(e @ LedgerError::Storage(_)) => {
            tracing::error!(guild_id = guild_id.get(), user_id, "Failed to adjust balance: {}", e);
            STORAGE_FAILED.to_string()
        }
    };

    reply_ephemeral_modal(ctx, modal, &content).await
}

/// Value of the amount box from a modal submission.
fn submitted_text(modal: &serenity::ModalInteraction) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == AMOUNT_INPUT_ID => {
                input.value.clone()
            }
            _ => None,
        })
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    mci: &serenity::ComponentInteraction,
    content: &str,
) -> Result<(), Error> {
    mci.create_response(
        &ctx.http,
        serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true),
        ),
    )
    .await?;
    Ok(())
}

async fn reply_ephemeral_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    content: &str,
) -> Result<(), Error> {
    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50"), Some(50));
        assert_eq!(parse_amount(" 7 "), Some(7));
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("+5"), None);
        assert_eq!(parse_amount("1.5"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("99999999999999999999"), None);
    }

    #[test]
    fn test_custom_ids_roundtrip_target_user() {
        assert_eq!(
            Direction::from_button_id("ledger_add:123"),
            Some((Direction::Credit, 123))
        );
        assert_eq!(
            Direction::from_button_id("ledger_sub:456"),
            Some((Direction::Debit, 456))
        );
        assert_eq!(
            Direction::from_modal_id("ledger_sub_modal:456"),
            Some((Direction::Debit, 456))
        );
        // Modal IDs are not button IDs and vice versa.
        assert_eq!(Direction::from_button_id("ledger_add_modal:1"), None);
        assert_eq!(Direction::from_modal_id("ledger_add:1"), None);
        assert_eq!(Direction::from_button_id("list_next"), None);
        assert_eq!(Direction::from_button_id("ledger_add:me"), None);
    }

    #[test]
    fn test_debit_negates_amount() {
        assert_eq!(Direction::Credit.signed(10), 10);
        assert_eq!(Direction::Debit.signed(10), -10);
    }
}
