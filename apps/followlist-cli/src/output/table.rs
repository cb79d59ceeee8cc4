//! Table display for account listings

use followlist_core::AccountSummary;

/// Web profile base used for result links
pub const PROFILE_BASE_URL: &str = "https://bsky.app/profile";

const NAME_WIDTH: usize = 28;
const HANDLE_WIDTH: usize = 32;

/// Truncate a string for table display, handling Unicode safely.
///
/// If the string exceeds `max_len` characters, it is truncated with "..."
/// appended.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Public profile link for an account
pub fn profile_url(account: &AccountSummary) -> String {
    format!("{PROFILE_BASE_URL}/{}", account.handle)
}

/// Print accounts as a name / handle / link table
pub fn print_account_table(accounts: &[AccountSummary]) {
    println!(
        "{:<name_w$}  {:<handle_w$}  PROFILE",
        "NAME",
        "HANDLE",
        name_w = NAME_WIDTH,
        handle_w = HANDLE_WIDTH
    );
    println!("{}", "-".repeat(NAME_WIDTH + HANDLE_WIDTH + 40));
    for account in accounts {
        println!("{}", account_row(account));
    }
}

fn account_row(account: &AccountSummary) -> String {
    format!(
        "{:<name_w$}  {:<handle_w$}  {}",
        truncate(account.label(), NAME_WIDTH),
        truncate(&format!("@{}", account.handle), HANDLE_WIDTH),
        profile_url(account),
        name_w = NAME_WIDTH,
        handle_w = HANDLE_WIDTH
    )
}

/// Print one `@handle` per line
pub fn print_handles<'a>(accounts: impl IntoIterator<Item = &'a AccountSummary>) {
    for account in accounts {
        println!("@{}", account.handle);
    }
}
