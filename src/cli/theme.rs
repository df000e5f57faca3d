//! Theme command implementation.

use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::theme::Theme;

use super::App;

#[derive(Serialize)]
struct ThemeReport {
    theme: Theme,
    changed: bool,
}

pub fn run(app: &App, name: Option<&str>, options: OutputOptions) -> Result<()> {
    let changed = match name {
        Some(raw) => {
            let theme: Theme = raw.parse()?;
            app.themes.set(theme)?;
            true
        }
        None => false,
    };

    let current = app.themes.current();
    let mut human = HumanOutput::new(if changed {
        format!("Theme set to {current}")
    } else {
        format!("Theme: {current}")
    });
    if !changed {
        let names: Vec<String> = Theme::ALL.iter().map(|t| t.to_string()).collect();
        human.push_detail(format!("available: {}", names.join(", ")));
    }

    emit_success(
        options,
        "theme",
        &ThemeReport {
            theme: current,
            changed,
        },
        Some(&human),
    )
}
