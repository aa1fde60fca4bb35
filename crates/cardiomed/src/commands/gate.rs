use std::process::ExitCode;

use log::info;

use cardiomed_core::{UpdateGate, UpdatePrompt};

use crate::bridge::LocalBridge;
use crate::cli::CheckArgs;
use crate::commands::Context;
use crate::error::AppError;

/// Exit status when a mandatory update blocks further use.
const EXIT_BLOCKED: u8 = 2;

pub async fn check(ctx: &Context, args: &CheckArgs) -> Result<ExitCode, AppError> {
    let bridge = LocalBridge::current().with_overrides(args.as_version.clone(), args.as_platform);
    let service = ctx.data_service();
    let trigger = args.gate_trigger();

    let mut gate = UpdateGate::new();
    gate.on_trigger(&trigger, &bridge, &service)
        .await
        .map_err(AppError::version_check_failed)?;

    let Some(prompt) = gate.visible_prompt() else {
        println!("Your app is up to date ({}).", bridge.version());
        return Ok(ExitCode::SUCCESS);
    };
    print!("{}", render_prompt(prompt));

    if args.dismiss {
        if gate.dismiss() {
            info!("Update prompt dismissed");
            println!("Reminder dismissed until the next check.");
        } else {
            println!("This update cannot be dismissed.");
        }
    }

    if gate.blocks_interaction() {
        Ok(ExitCode::from(EXIT_BLOCKED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn render_prompt(prompt: &UpdatePrompt) -> String {
    let mut out = format!(
        "{}\n{}\n\nCurrent version:  {}\nRequired version: {}\n",
        prompt.title(),
        prompt.summary(),
        prompt.current_version,
        prompt.required_version
    );
    if let Some(notes) = &prompt.release_notes {
        out.push_str("\nWhat's new:\n");
        for line in notes.lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_versions_and_notes() {
        let prompt = UpdatePrompt {
            current_version: "1.2.0".to_string(),
            required_version: "1.3.0".to_string(),
            release_notes: Some("Faster search\nECG export".to_string()),
            priority: true,
        };

        let text = render_prompt(&prompt);

        assert!(text.starts_with("Critical Update Required\n"));
        assert!(text.contains("Current version:  1.2.0"));
        assert!(text.contains("Required version: 1.3.0"));
        assert!(text.contains("  Faster search\n  ECG export\n"));
    }

    #[test]
    fn render_without_notes_skips_section() {
        let prompt = UpdatePrompt {
            current_version: "1.2.0".to_string(),
            required_version: "1.2.1".to_string(),
            release_notes: None,
            priority: false,
        };

        let text = render_prompt(&prompt);

        assert!(text.starts_with("Update Available\n"));
        assert!(!text.contains("What's new"));
    }
}
