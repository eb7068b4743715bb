//! Inline keyboards attached to bot messages.

use crate::models::intent::CallbackAction;
use crate::models::{Gender, RegistrationStep, SearchFilter, VipPlan};
use crate::notices;
use crate::transport::{Button, Menu};
use crate::types::UserId;

pub const STATES_PER_PAGE: usize = 10;

pub const COUNTRIES: [(&str, &str); 5] = [
    ("India 🇮🇳", "India"),
    ("USA 🇺🇸", "USA"),
    ("UK 🇬🇧", "UK"),
    ("Canada 🇨🇦", "Canada"),
    ("Other 🌍", "Other"),
];

/// Country that opens the paged state picker.
pub const STATE_COUNTRY: &str = "India";

pub const INDIAN_STATES: [&str; 30] = [
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Delhi",
    "Jammu & Kashmir",
];

const SUPPORT_URL: &str = "https://t.me/YourSupportUser";
const CHANNEL_URL: &str = "https://t.me/Ind_AnonChatbotUpdates";

fn pairs(buttons: Vec<Button>) -> Vec<Vec<Button>> {
    buttons.chunks(2).map(<[Button]>::to_vec).collect()
}

fn manual_entry() -> Vec<Button> {
    vec![Button::action(
        "✍️ Type Manually",
        CallbackAction::RegManualEntry,
    )]
}

pub fn gender() -> Menu {
    Menu::Inline(vec![vec![
        Button::action("Male ♂️", CallbackAction::RegGender(Gender::Male)),
        Button::action("Female ♀️", CallbackAction::RegGender(Gender::Female)),
    ]])
}

pub fn countries() -> Menu {
    let buttons = COUNTRIES
        .iter()
        .map(|(label, key)| Button::action(*label, CallbackAction::RegCountry(key.to_string())))
        .collect();
    let mut rows = pairs(buttons);
    rows.push(manual_entry());
    Menu::Inline(rows)
}

/// One page of states with prev/next navigation. Out-of-range pages clamp.
pub fn states(page: usize) -> Menu {
    let last_page = (INDIAN_STATES.len() - 1) / STATES_PER_PAGE;
    let page = page.min(last_page);
    let start = page * STATES_PER_PAGE;
    let end = (start + STATES_PER_PAGE).min(INDIAN_STATES.len());

    let buttons = INDIAN_STATES[start..end]
        .iter()
        .map(|state| Button::action(*state, CallbackAction::RegState(state.to_string())))
        .collect();
    let mut rows = pairs(buttons);

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(Button::action("⬅️ Prev", CallbackAction::RegPage(page - 1)));
    }
    if end < INDIAN_STATES.len() {
        nav.push(Button::action("Next ➡️", CallbackAction::RegPage(page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(manual_entry());
    Menu::Inline(rows)
}

pub fn settings() -> Menu {
    Menu::Inline(vec![
        vec![
            Button::action(
                "🔄 Update Gender",
                CallbackAction::Reset(RegistrationStep::Gender),
            ),
            Button::action("🔄 Update Age", CallbackAction::Reset(RegistrationStep::Age)),
        ],
        vec![Button::action(
            "🔄 Update Location",
            CallbackAction::Reset(RegistrationStep::Location),
        )],
        vec![Button::action("❌ Close", CallbackAction::CloseSettings)],
    ])
}

pub fn preferences() -> Menu {
    Menu::Inline(vec![
        vec![Button::action(
            "🎲 Random (Free)",
            CallbackAction::SetPreference(SearchFilter::Any),
        )],
        vec![
            Button::action(
                "👩 Girls (VIP)",
                CallbackAction::SetPreference(SearchFilter::Female),
            ),
            Button::action(
                "👨 Boys (VIP)",
                CallbackAction::SetPreference(SearchFilter::Male),
            ),
        ],
    ])
}

pub fn plans() -> Menu {
    Menu::Inline(
        VipPlan::ALL
            .into_iter()
            .map(|plan| vec![Button::action(notices::plan_button(plan), CallbackAction::SelectPlan(plan))])
            .collect(),
    )
}

pub fn proof_review(user_id: UserId, days: i64) -> Menu {
    Menu::Inline(vec![
        vec![Button::action(
            format!("✅ Approve ({} Days)", days),
            CallbackAction::Approve {
                target: user_id,
                days,
            },
        )],
        vec![Button::action("❌ Reject", CallbackAction::Reject(user_id))],
    ])
}

pub fn after_exit(tag: &str) -> Menu {
    Menu::Inline(vec![
        vec![Button::action(
            "⚠️ Report User",
            CallbackAction::Report(tag.to_string()),
        )],
        vec![Button::action(
            "🗣 Find new partner",
            CallbackAction::FindNewPartner,
        )],
    ])
}

pub fn appeal() -> Menu {
    Menu::Inline(vec![vec![Button::action(
        "🆘 Contact Admin / Appeal",
        CallbackAction::BanAppeal,
    )]])
}

pub fn rechat_invite(requester: UserId) -> Menu {
    Menu::Inline(vec![vec![Button::action(
        "✅ Accept Re-Chat",
        CallbackAction::AcceptRechat(requester),
    )]])
}

pub fn help_links() -> Menu {
    Menu::Inline(vec![vec![
        Button::link("💬 Support", SUPPORT_URL),
        Button::link("📢 Channel", CHANNEL_URL),
    ]])
}
