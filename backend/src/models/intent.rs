//! Inbound user intents, decoded once at the platform boundary.
//!
//! Menu buttons arrive as free text and inline buttons as opaque callback
//! strings. Both are turned into tagged enums here so nothing past the
//! dispatcher inspects raw labels, apart from the relay content itself.

use super::{Gender, RegistrationStep, SearchFilter, VipPlan, MAX_GRANT_DAYS};
use crate::types::UserId;

/// Reply-keyboard labels. Shared with the transport that renders them.
pub mod labels {
    pub const CHAT: &str = "💬 Chat";
    pub const RECHAT: &str = "🔄 Re-Chat";
    pub const SETTINGS: &str = "⚙️ Settings";
    pub const PREMIUM: &str = "💎 Premium";
    pub const HELP: &str = "❓ Help";
    pub const ABOUT: &str = "ℹ️ About";
    pub const EXIT: &str = "❌ Exit Chat";
    pub const REPORT: &str = "🚨 Report Partner";
    pub const RANDOM: &str = "🎲 Random";
    pub const GIRLS: &str = "👩 Girls (VIP)";
    pub const BOYS: &str = "👨 Boys (VIP)";
    pub const BACK: &str = "🔙 Back";
    pub const CANCEL: &str = "🔙 Cancel";
    pub const PREFERENCES: &str = "❤️ Preferences";

    pub const ALL: [&str; 14] = [
        CHAT,
        RECHAT,
        SETTINGS,
        PREMIUM,
        HELP,
        ABOUT,
        EXIT,
        REPORT,
        RANDOM,
        GIRLS,
        BOYS,
        BACK,
        CANCEL,
        PREFERENCES,
    ];
}

/// Default grant for `/addvip` without an explicit day-count.
pub const DEFAULT_GRANT_DAYS: i64 = 30;

fn grant_days_in_range(days: &i64) -> bool {
    (1..=MAX_GRANT_DAYS).contains(days)
}

/// Text that must never be relayed to a partner: commands and menu labels.
pub fn is_control_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('/') || labels::ALL.contains(&trimmed)
}

/// Privileged operations. Authorization is checked by the services, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Ban(UserId),
    Unban(UserId),
    AddVip { target: UserId, days: i64 },
    RemoveVip(UserId),
    Reply { target: UserId, text: String },
    Broadcast(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Start,
    Chat,
    Exit,
    /// `/report [tag]` or the report button.
    Report(Option<String>),
    Cancel,
    Rechat,
    Help,
    About,
    Preferences,
    Premium,
    Settings,
    Back,
    /// Search-menu buttons.
    Search(SearchFilter),
    Support(String),
    Admin(AdminCommand),
    /// Known command with missing or malformed arguments.
    Usage(&'static str),
    UnknownCommand(String),
    /// Anything else: registration input, report reasons or chat content.
    Text(String),
}

impl Intent {
    pub fn decode(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(intent) = Self::from_label(trimmed) {
            return intent;
        }
        match trimmed.strip_prefix('/') {
            Some(command) => Self::from_command(command),
            None => Intent::Text(text.to_string()),
        }
    }

    fn from_label(text: &str) -> Option<Self> {
        let intent = match text {
            labels::CHAT => Intent::Chat,
            labels::RECHAT => Intent::Rechat,
            labels::SETTINGS => Intent::Settings,
            labels::PREMIUM => Intent::Premium,
            labels::HELP => Intent::Help,
            labels::ABOUT => Intent::About,
            labels::EXIT => Intent::Exit,
            labels::REPORT => Intent::Report(None),
            labels::RANDOM => Intent::Search(SearchFilter::Any),
            labels::GIRLS => Intent::Search(SearchFilter::Female),
            labels::BOYS => Intent::Search(SearchFilter::Male),
            labels::BACK => Intent::Back,
            labels::CANCEL => Intent::Cancel,
            labels::PREFERENCES => Intent::Preferences,
            _ => return None,
        };
        Some(intent)
    }

    fn from_command(command: &str) -> Self {
        let mut parts = command.split_whitespace();
        let name = parts
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        match name.as_str() {
            "start" => Intent::Start,
            "chat" => Intent::Chat,
            "exit" => Intent::Exit,
            "report" => Intent::Report(args.first().map(|tag| tag.to_string())),
            "cancel" => Intent::Cancel,
            "rechat" => Intent::Rechat,
            "help" => Intent::Help,
            "about" => Intent::About,
            "preferences" => Intent::Preferences,
            "premium" => Intent::Premium,
            "settings" => Intent::Settings,
            "support" if args.is_empty() => Intent::Usage("/support Your Message Here"),
            "support" => Intent::Support(args.join(" ")),
            "ban" => Self::admin_target(&args, AdminCommand::Ban, "/ban <user_id>"),
            "unban" => Self::admin_target(&args, AdminCommand::Unban, "/unban <user_id>"),
            "removevip" => {
                Self::admin_target(&args, AdminCommand::RemoveVip, "/removevip <user_id>")
            }
            "addvip" => {
                let target = args.first().and_then(|raw| raw.parse::<UserId>().ok());
                let days = match args.get(1) {
                    Some(raw) => raw.parse::<i64>().ok().filter(grant_days_in_range),
                    None => Some(DEFAULT_GRANT_DAYS),
                };
                match (target, days) {
                    (Some(target), Some(days)) => {
                        Intent::Admin(AdminCommand::AddVip { target, days })
                    }
                    _ => Intent::Usage("/addvip <user_id> [days]"),
                }
            }
            "reply" => match args.first().and_then(|raw| raw.parse::<UserId>().ok()) {
                Some(target) if args.len() > 1 => Intent::Admin(AdminCommand::Reply {
                    target,
                    text: args[1..].join(" "),
                }),
                _ => Intent::Usage("/reply <user_id> <message>"),
            },
            "broadcast" if args.is_empty() => Intent::Usage("/broadcast Your Message"),
            "broadcast" => Intent::Admin(AdminCommand::Broadcast(args.join(" "))),
            _ => Intent::UnknownCommand(name),
        }
    }

    fn admin_target(
        args: &[&str],
        build: fn(UserId) -> AdminCommand,
        usage: &'static str,
    ) -> Self {
        match args.first().and_then(|raw| raw.parse::<UserId>().ok()) {
            Some(target) => Intent::Admin(build(target)),
            None => Intent::Usage(usage),
        }
    }

    /// Main-menu navigation; pressing one of these cancels a running search.
    pub fn is_menu_navigation(&self) -> bool {
        matches!(
            self,
            Intent::Back
                | Intent::Settings
                | Intent::Chat
                | Intent::Premium
                | Intent::Help
                | Intent::About
                | Intent::Rechat
                | Intent::Preferences
        )
    }
}

/// Inline-button actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    RegGender(Gender),
    RegCountry(String),
    RegState(String),
    RegManualEntry,
    RegPage(usize),
    Reset(RegistrationStep),
    CloseSettings,
    SelectPlan(VipPlan),
    Approve { target: UserId, days: i64 },
    Reject(UserId),
    BanAppeal,
    AcceptRechat(UserId),
    FindNewPartner,
    Report(String),
    SetPreference(SearchFilter),
}

impl CallbackAction {
    pub fn decode(data: &str) -> Option<Self> {
        if let Some(plan) = VipPlan::from_key(data) {
            return Some(CallbackAction::SelectPlan(plan));
        }
        let action = match data {
            "reg_manual_entry" => CallbackAction::RegManualEntry,
            "reset_gender" => CallbackAction::Reset(RegistrationStep::Gender),
            "reset_age" => CallbackAction::Reset(RegistrationStep::Age),
            "reset_loc" => CallbackAction::Reset(RegistrationStep::Location),
            "close_settings" => CallbackAction::CloseSettings,
            "ban_appeal" => CallbackAction::BanAppeal,
            "find_new_partner" => CallbackAction::FindNewPartner,
            _ => return Self::decode_with_payload(data),
        };
        Some(action)
    }

    fn decode_with_payload(data: &str) -> Option<Self> {
        if let Some(gender) = data.strip_prefix("reg_gender_") {
            return gender.parse().ok().map(CallbackAction::RegGender);
        }
        if let Some(country) = data.strip_prefix("reg_country_") {
            return Some(CallbackAction::RegCountry(country.to_string()));
        }
        if let Some(state) = data.strip_prefix("reg_state_") {
            return Some(CallbackAction::RegState(state.to_string()));
        }
        if let Some(page) = data.strip_prefix("reg_page_") {
            return page.parse().ok().map(CallbackAction::RegPage);
        }
        if let Some(rest) = data.strip_prefix("approve_") {
            let (target, days) = rest.split_once('_')?;
            return Some(CallbackAction::Approve {
                target: target.parse().ok()?,
                days: days.parse().ok().filter(grant_days_in_range)?,
            });
        }
        if let Some(target) = data.strip_prefix("reject_") {
            return target.parse().ok().map(CallbackAction::Reject);
        }
        if let Some(requester) = data.strip_prefix("accept_rechat_") {
            return requester.parse().ok().map(CallbackAction::AcceptRechat);
        }
        if let Some(tag) = data.strip_prefix("report_") {
            return Some(CallbackAction::Report(tag.to_string()));
        }
        if let Some(filter) = data.strip_prefix("set_pref_") {
            return filter.parse().ok().map(CallbackAction::SetPreference);
        }
        None
    }

    /// Callback string carried by the button.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::RegGender(gender) => format!("reg_gender_{}", gender.as_str()),
            CallbackAction::RegCountry(country) => format!("reg_country_{}", country),
            CallbackAction::RegState(state) => format!("reg_state_{}", state),
            CallbackAction::RegManualEntry => "reg_manual_entry".to_string(),
            CallbackAction::RegPage(page) => format!("reg_page_{}", page),
            CallbackAction::Reset(RegistrationStep::Gender) => "reset_gender".to_string(),
            CallbackAction::Reset(RegistrationStep::Age) => "reset_age".to_string(),
            CallbackAction::Reset(RegistrationStep::Location) => "reset_loc".to_string(),
            CallbackAction::CloseSettings => "close_settings".to_string(),
            CallbackAction::SelectPlan(plan) => plan.key().to_string(),
            CallbackAction::Approve { target, days } => format!("approve_{}_{}", target, days),
            CallbackAction::Reject(target) => format!("reject_{}", target),
            CallbackAction::BanAppeal => "ban_appeal".to_string(),
            CallbackAction::AcceptRechat(requester) => format!("accept_rechat_{}", requester),
            CallbackAction::FindNewPartner => "find_new_partner".to_string(),
            CallbackAction::Report(tag) => format!("report_{}", tag),
            CallbackAction::SetPreference(filter) => format!("set_pref_{}", filter.as_str()),
        }
    }
}
