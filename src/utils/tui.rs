use indicatif::{ProgressBar, ProgressStyle};

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}").unwrap());
    bar.set_message(message.into());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}
