// UI layer: the only interactive piece is the one-time OpenID prompt;
// everything else is spinner feedback while a network call is in
// flight.

use std::io;
use std::time::Duration;

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

/// Ask the operator for the platform OpenID. Reached at most once per
/// machine: the resolver caches the answer to account.txt.
pub fn prompt_account_id() -> io::Result<String> {
    Input::new().with_prompt("YouthStudy OpenID").interact_text()
}

/// Start a ticking spinner labelled `msg`. The caller clears it when
/// the call returns.
pub fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
