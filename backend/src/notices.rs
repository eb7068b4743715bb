//! User-facing text. Plain text only; no parse mode is requested.

use chrono_tz::Tz;

use crate::error::PolicyViolation;
use crate::models::{SearchFilter, User, VipGrant, VipPlan};
use crate::services::PremiumStatus;
use crate::types::UserId;
use crate::utils::format_expiry;

const RULE: &str = "━━━━━━━━━━━━━━━━━━";

pub const BANNED: &str = "🚫 YOU ARE BANNED";
pub const APPEAL_SENT: &str = "✅ Appeal Sent.\nThe admin has been notified.";
pub const NOT_IN_CHAT: &str = "⚠️ You are not in a chat.";
pub const ALREADY_IN_CHAT: &str = "⚠️ You are already in a chat!\nUse /exit to leave first.";
pub const STILL_SEARCHING: &str = "🔍 Searching for a partner...\nPlease wait.";
pub const IDLE_HINT: &str = "⚠️ You are not currently in a chat.\n\nPlease use the 💬 Chat button or type /chat to start finding a partner!";
pub const SEARCH_CANCELLED: &str = "🛑 Search Cancelled.";
pub const MAIN_MENU: &str = "👇 Main Menu";
pub const HOME: &str = "🏠 Main Menu";
pub const PARTNER_DISCONNECTED: &str = "❌ Partner disconnected.";
pub const LINKS_BLOCKED: &str = "🚫 Links are strictly prohibited.";
pub const ACTION_CANCELLED: &str = "🚫 Action cancelled.";
pub const REPORT_CANCELLED_IN_CHAT: &str = "🚫 Report cancelled. Continuing chat...";
pub const REPORT_CANCELLED: &str = "🚫 Report cancelled.";
pub const REPORT_SUBMITTED: &str = "✅ Report Submitted.";
pub const REPORT_EXPIRED: &str = "❌ Session Expired.\nCannot report old chats.";
pub const NO_PARTNER_TO_REPORT: &str = "⚠️ No partner found to report.";
pub const VIP_ONLY: &str = "🔒 VIP Only!\nPlease buy Premium to select gender.";
pub const RECHAT_VIP_ONLY: &str = "💎 VIP Only Feature\n\nOnly Premium members can reconnect with previous partners.\nTap 💎 Premium to upgrade!";
pub const RECHAT_IN_CHAT: &str = "⚠️ You are already in a chat! Exit first.";
pub const RECHAT_NO_PARTNER: &str = "❌ No previous partner found.\nMatch with someone new first!";
pub const RECHAT_BUSY: &str = "⚠️ Partner Busy.\nYour previous partner is currently in another chat.";
pub const RECHAT_SENT: &str = "📨 Request Sent!\nWaiting for them to accept...";
pub const RECHAT_FAILED: &str = "❌ Failed.\nThe user has blocked the bot or is unavailable.";
pub const RECHAT_INVITE: &str = "🔄 Reconnect Request\n\nYour previous partner wants to chat again!\nDo you want to accept?";
pub const RECHAT_TOO_LATE: &str = "❌ Too late.\nThe other user entered another chat.";
pub const PREMIUM_IN_CHAT: &str = "⚠️ Action Blocked\n\nYou cannot buy Premium while in a chat!\nPlease tap ❌ Exit Chat first, then try again.";
pub const PREMIUM_WHILE_SEARCHING: &str = "⚠️ Please stop searching first.";
pub const CHOOSE_PLAN: &str = "💎 Choose VIP Plan:";
pub const PROOF_RECEIVED: &str = "✅ Screenshot Received!\nPlease wait while the admin verifies your payment.";
pub const PAYMENT_REJECTED: &str = "❌ Payment Rejected.\nYour screenshot was not accepted. Please contact the Admin.";
pub const ASK_GENDER: &str = "👋 Welcome! Step 1/3\n\nPlease select your Gender:";
pub const ASK_AGE: &str = "🎂 Step 2/3: Age\n\nPlease type your age (e.g., 24):";
pub const ASK_LOCATION: &str = "🌍 Step 3/3: Location\n\nWhere are you from?";
pub const ASK_STATE: &str = "🇮🇳 Select your State:";
pub const ASK_MANUAL_LOCATION: &str = "✍️ Manual Entry\n\nPlease type your City or Country name below:";
pub const INVALID_AGE: &str = "⚠️ Invalid age. Please enter 16-80.";
pub const LOCATION_TOO_LONG: &str = "⚠️ Too long. Keep it short.";
pub const SUPPORT_SENT: &str = "✅ Support Request Sent!\nThe admin will reply shortly.";
pub const SUPPORT_FAILED: &str = "❌ Could not reach the admin. Please try again later.";
pub const SETTINGS_CLOSED: &str = "✅ Settings closed.";
pub const UNKNOWN_COMMAND: &str = "⚠️ Unknown command.";
pub const SOMETHING_WENT_WRONG: &str = "⚠️ Something went wrong. Please try again.";
pub const BROADCAST_SENT: &str = "✅ Posted to Channel!";

pub const HELP: &str = "🤖 Bot Help\n━━━━━━━━━━━━━━━━━━\n💬 Chat - Start matching\n❌ Exit - End chat\n💎 Premium - See gender & unlimited chats\n💡 Rules: No links, and no media for the first 2 mins.\n━━━━━━━━━━━━━━━━━━";
pub const ABOUT: &str = "ℹ️ About\n\nEnjoy free, anonymous one-to-one chats with real people.\nUpgrade anytime to unlock smart filters and preference-based matching.\n\nMade in India";

pub const NOT_WHILE_CHATTING: &str = "⚠️ Not available while in a chat. Exit first.";

/// Reply for an action a content or state policy refused.
pub fn policy(violation: &PolicyViolation) -> String {
    match violation {
        PolicyViolation::LinkBlocked => LINKS_BLOCKED.to_string(),
        PolicyViolation::MediaLocked { remaining_secs } => media_locked(*remaining_secs),
        PolicyViolation::PremiumRequired => VIP_ONLY.to_string(),
        PolicyViolation::InActiveChat => NOT_WHILE_CHATTING.to_string(),
        PolicyViolation::Banned => BANNED.to_string(),
    }
}

pub fn not_configured(what: &str) -> String {
    format!("⚠️ Error: {} is not configured.", what)
}

pub fn usage(usage: &str) -> String {
    format!("⚠️ Usage: {}", usage)
}

fn status_label(status: PremiumStatus, tz: &Tz) -> String {
    match status {
        PremiumStatus::Free => "Free Member".to_string(),
        PremiumStatus::Vip { expires_at } => {
            format!("🌟 VIP Member\n📅 Expires: {}", format_expiry(expires_at, tz))
        }
        PremiumStatus::Lifetime => "🌟 VIP Member\n📅 Expires: Lifetime".to_string(),
        PremiumStatus::Superuser => "👑 Superuser\n📅 Expires: Lifetime".to_string(),
    }
}

pub fn welcome(status: PremiumStatus, tz: &Tz) -> String {
    format!(
        "✅ Registration Complete!\n\nYour Status: {}\n\nUse /chat to start matching.",
        status_label(status, tz)
    )
}

pub fn settings(user: &User, status: PremiumStatus, tz: &Tz) -> String {
    format!(
        "⚙️ Settings & Profile\n{RULE}\n💎 Status: {}\n{RULE}\n👤 Your Details:\n• Gender: {}\n• Age: {}\n• Location: {}\n\n👇 Tap buttons to update:",
        status_label(status, tz),
        user.gender.map(|g| g.label()).unwrap_or("N/A"),
        user.age.map(|age| age.to_string()).unwrap_or_else(|| "N/A".to_string()),
        user.country.as_deref().unwrap_or("Unknown"),
    )
}

pub fn searching(filter: SearchFilter) -> String {
    format!("🔍 Searching for: {}...", filter.label())
}

/// What one side is told about the other. Gender is hidden from free users.
pub fn matched(partner: Option<&User>, viewer_is_premium: bool, session: &str) -> String {
    let country = partner
        .and_then(|p| p.country.as_deref())
        .unwrap_or("Unknown");
    let gender = if viewer_is_premium {
        partner
            .and_then(|p| p.gender)
            .map(|g| g.label())
            .unwrap_or("Unknown")
    } else {
        "👑 For Premium Users Only"
    };
    let age = partner
        .and_then(|p| p.age)
        .map(|age| age.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "✅ Partner Matched\n{RULE}\n🌍 Country: {country}\n👥 Gender: {gender}\n📣 Age: {age}\n{RULE}\n🚫 Links are restricted\n⏱️ Media sharing unlocked after 2 minutes\n{RULE}\n🆔 Session: {session}\n/exit - Leave the chat"
    )
}

pub fn you_left(tag: &str) -> String {
    format!(
        "🚫 You left the chat\n____________________\n\n⚠️ Report TAG: {tag}\nTo report this user:\n/report {tag}"
    )
}

pub fn partner_left(tag: &str) -> String {
    format!(
        "🚫 Partner left the chat\n____________________\n\n⚠️ Report TAG: {tag}\nTo report this chat:\n/report {tag}"
    )
}

pub fn report_prompt(tag: &str) -> String {
    format!("📝 Reporting User (Tag: {tag})\n\nPlease type the reason for your report:\n(Type /cancel to stop)")
}

pub fn media_locked(remaining_secs: u64) -> String {
    format!("⏱️ Media locked. Wait {}s.", remaining_secs)
}

pub fn field_updated(field: &str, value: &str) -> String {
    format!("✅ {} Updated to {}!", field, value)
}

pub fn preferences(current: SearchFilter) -> String {
    let label = match current {
        SearchFilter::Any => "Random 🎲".to_string(),
        other => format!("{} 👤", other.label()),
    };
    format!("❤️ Match Preferences\n{RULE}\n🎯 Current Target: {label}\n\n👇 Select who you want to meet:")
}

pub fn preference_saved(filter: SearchFilter) -> String {
    format!("✅ Search Preference updated to: {}", filter.label())
}

pub fn plan_button(plan: VipPlan) -> String {
    format!("{} - ₹{}", plan.label(), plan.amount_rupees())
}

pub fn payment_instructions(plan: VipPlan) -> String {
    let amount = plan.amount_rupees();
    format!(
        "💎 Upgrade to VIP: {}\n{RULE}\n💰 Pay Amount: ₹{amount}\n\n1️⃣ Scan the payment QR code.\n2️⃣ Pay exactly ₹{amount}.\n3️⃣ Send the payment screenshot here.\n{RULE}\n⏳ Your plan is activated manually after verification.",
        plan.label()
    )
}

pub fn proof_for_admin(user_id: UserId, days: i64, order_id: Option<&str>) -> String {
    let mut text = format!("💰 PAYMENT PROOF\nFrom User: {}\nRequested Plan: {} Days", user_id, days);
    if let Some(order_id) = order_id {
        text.push_str(&format!("\nOrder: {}", order_id));
    }
    text
}

pub fn payment_verified(grant: &VipGrant) -> String {
    let mut text = format!(
        "🎉 Payment Verified!\n\nYou are now a VIP Member for {} Days!",
        grant.total_days()
    );
    if grant.carried_days > 0 {
        text.push_str(&format!("\n(Added to existing {} days)", grant.carried_days));
    }
    text.push_str("\nStart chatting with /chat.");
    text
}

pub fn approved_for_admin(target: UserId, grant: &VipGrant) -> String {
    format!(
        "✅ APPROVED!\nUser {} given {} days.\n(Total VIP: {} days)",
        target,
        grant.added_days,
        grant.total_days()
    )
}

pub fn rejected_for_admin(target: UserId) -> String {
    format!("❌ REJECTED.\nUser {} was denied.", target)
}

pub fn vip_added(target: UserId, grant: &VipGrant, tz: &Tz) -> String {
    format!(
        "💎 VIP Added Successfully\n━━━━━━━━━━━━━━━\n👤 User: {}\n⏳ Duration: {} Days\n📅 Expires On: {}",
        target,
        grant.added_days,
        format_expiry(grant.expires_at, tz)
    )
}

pub fn vip_removed(target: UserId, removed: bool) -> String {
    if removed {
        format!("❌ VIP Removed from User {}", target)
    } else {
        format!("⚠️ User {} has no profile.", target)
    }
}

pub fn banned(target: UserId) -> String {
    format!("🚫 Banned User {}", target)
}

pub fn unbanned(target: UserId, removed: bool) -> String {
    if removed {
        format!("✅ Unbanned User {}", target)
    } else {
        format!("⚠️ User {} was not banned.", target)
    }
}

pub fn support_for_admin(user_id: UserId, message: &str) -> String {
    format!(
        "🆘 SUPPORT REQUEST\n━━━━━━━━━━━━━━━\n👤 From: {user_id}\n📝 Message: {message}\n━━━━━━━━━━━━━━━\n👇 To Reply:\n/reply {user_id} YourResponse"
    )
}

pub fn admin_reply(text: &str) -> String {
    format!("👨‍💻 Admin Reply:\n\n{}", text)
}

pub fn delivered_to(target: UserId) -> String {
    format!("✅ Sent to {}.", target)
}

pub fn delivery_failed(target: UserId) -> String {
    format!("❌ Failed to reach {}.", target)
}
