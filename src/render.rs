//! Terminal rendering of gate state, the intake form and results.

use crate::error::GateError;
use crate::gate::{GateStatus, Notice};
use crate::intake::{AgeGroup, Diagnosis, Gender, IntakeForm};
use crate::submission::{SubmissionFailure, SubmissionState};

const RULE_WIDTH: usize = 50;
const ANALYSIS_BANNER: &str = "⚙️  Analysis complete";

pub fn diagnosis(result: &Diagnosis) -> String {
    let mut out = String::new();
    out.push_str(&"─".repeat(RULE_WIDTH));
    out.push('\n');

    if let Some(source) = &result.source {
        out.push_str(&format!("🤖 Analysis Source: {}\n\n", source));
    }

    out.push_str("🔍 Possible Diagnoses\n");
    for item in &result.diagnoses {
        out.push_str(&format!("   • {}\n", item));
    }

    out.push_str("\n💡 Recommended Next Steps\n");
    for item in &result.recommendations {
        out.push_str(&format!("   • {}\n", item));
    }

    out.push_str(&"─".repeat(RULE_WIDTH));
    out
}

pub fn notice(notice: &Notice) -> String {
    format!("❌ {}", notice)
}

pub fn error(err: &GateError) -> String {
    match err {
        GateError::NotStarred(n) | GateError::AuthorizationLost(n) => notice(n),
        e if e.is_local() => format!("⚠️  {}", e),
        e => format!("❌ {}", e),
    }
}

/// What the shell prints once a submission returns. A local rejection sent
/// nothing and changed nothing, so it prints the reason alone.
pub fn submission_outcome(outcome: &Result<Diagnosis, GateError>, shown: Option<&Diagnosis>) -> String {
    match outcome {
        Err(e) if e.is_local() => error(e),
        Ok(result) => format!("{}\n\n{}", ANALYSIS_BANNER, diagnosis(result)),
        Err(e) => {
            let mut out = format!("{}\n\n{}", ANALYSIS_BANNER, error(e));
            if let Some(result) = shown {
                out.push_str("\n\n");
                out.push_str(&diagnosis(result));
            }
            out
        }
    }
}

pub fn gate_status(status: &GateStatus) -> String {
    match status {
        GateStatus::Unverified => "⭐ Star required: not verified".to_string(),
        GateStatus::Verifying => "⏳ Verifying...".to_string(),
        GateStatus::Verified { username, since } => {
            format!("✅ Verified as '{}' since {}", username, since.format("%H:%M:%S UTC"))
        }
    }
}

pub fn submission_status(state: &SubmissionState) -> String {
    match state {
        SubmissionState::Idle => "idle".to_string(),
        SubmissionState::Submitting { .. } => "analyzing...".to_string(),
        SubmissionState::Succeeded(_) => "results ready".to_string(),
        SubmissionState::Failed(SubmissionFailure::AuthorizationLost(_)) => {
            "failed: star verification lost".to_string()
        }
        SubmissionState::Failed(SubmissionFailure::ServiceUnavailable { reason, .. }) => {
            format!("failed: {} (showing fallback)", reason)
        }
    }
}

pub fn form(form: &IntakeForm) -> String {
    let symptoms = if form.symptoms.trim().is_empty() {
        "(empty)"
    } else {
        form.symptoms.as_str()
    };
    format!(
        "   Symptoms:  {}\n   Age group: {}\n   Gender:    {}",
        symptoms,
        form.age_group.map(|g| g.label()).unwrap_or("(select)"),
        form.gender.map(|g| g.as_str()).unwrap_or("(select)"),
    )
}

pub fn choices() -> String {
    let ages: Vec<&str> = AgeGroup::ALL.iter().map(|g| g.label()).collect();
    let genders: Vec<&str> = Gender::ALL.iter().map(|g| g.as_str()).collect();
    format!("   Age groups: {}\n   Genders:    {}", ages.join(", "), genders.join(", "))
}
