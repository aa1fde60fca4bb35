use std::process::ExitCode;

use cardiomed_core::{Cha2Ds2VascInputs, HasBledInputs, RiskLevel};

use crate::cli::ScoresCommand;

pub fn run(command: &ScoresCommand) -> ExitCode {
    println!("{}", render(command));
    ExitCode::SUCCESS
}

fn render(command: &ScoresCommand) -> String {
    match *command {
        ScoresCommand::Cha2ds2vasc {
            age,
            female,
            chf,
            hypertension,
            diabetes,
            stroke,
            vascular,
        } => {
            let inputs = Cha2Ds2VascInputs {
                congestive_heart_failure: chf,
                hypertension,
                age,
                diabetes,
                stroke_history: stroke,
                vascular_disease: vascular,
                is_female: female,
            };
            format!("CHA₂DS₂-VASc: {}", inputs.score())
        }
        ScoresCommand::HasBled {
            hypertension,
            renal,
            liver,
            stroke,
            bleeding,
            labile_inr,
            elderly,
            drugs,
            alcohol,
        } => {
            let inputs = HasBledInputs {
                hypertension,
                abnormal_renal: renal,
                abnormal_liver: liver,
                stroke_history: stroke,
                bleeding_history: bleeding,
                labile_inr,
                elderly,
                drugs,
                alcohol,
            };
            let mut out = format!("HAS-BLED: {}", inputs.score());
            if inputs.is_high_risk() {
                out.push_str(" (high bleeding risk)");
            }
            out
        }
        ScoresCommand::Level { level } => format!(
            "Cardiovascular risk: {level} ({}/{})",
            level.rank(),
            RiskLevel::VeryHigh.rank()
        ),
    }
}
