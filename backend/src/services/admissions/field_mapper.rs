use super::model::{NormalizedSubmission, Submission};
use std::collections::BTreeMap;

/// `(answer, details)` pairs whose details are forced to "No" when the answer is no/none.
pub const PAIRED_FIELDS: [(&str, &str); 4] = [
    ("allergies", "allergy_details"),
    ("medication", "medication_details"),
    ("siblings_at_aps", "siblings_details"),
    ("dietary_requirements", "dietary_details"),
];

pub const ACCEPTANCE_FIELD: &str = "tcAcceptance";

fn is_negative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "no" | "none")
}

/// Checkbox-style values the form may post for an accepted checkbox.
fn is_accepted(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "on" | "1" | "accepted"
    )
}

pub fn normalize(submission: &Submission) -> NormalizedSubmission {
    let mut fields: BTreeMap<String, String> = submission
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (answer, details) in PAIRED_FIELDS {
        if fields.get(answer).is_some_and(|value| is_negative(value)) {
            fields.insert(details.to_string(), "No".to_string());
        }
    }

    let accepted = fields
        .get(ACCEPTANCE_FIELD)
        .is_some_and(|value| is_accepted(value));
    fields.insert(
        ACCEPTANCE_FIELD.to_string(),
        if accepted { "Yes" } else { "No" }.to_string(),
    );

    NormalizedSubmission::new(fields)
}
