//! Terminal output helpers

mod printer;
pub mod progress;
pub mod table;

pub use printer::{
    print_header, print_info, print_json, print_key_value, print_status, print_success,
    print_warning,
};
pub use progress::FetchSpinner;
pub use table::{print_account_table, print_handles, profile_url, truncate};
