//! Validate command - checks candidates without touching storage

use std::path::PathBuf;

use clap::Args;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::RegistrationConfig;
use crate::domain::user::{FieldError, FieldErrorKind, UserCandidate};

/// Arguments for the validate command
#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// JSON file holding one candidate object or an array of them
    pub file: PathBuf,

    /// Area code applied to candidates that leave it out (overrides config)
    #[arg(long)]
    pub default_area_code: Option<String>,
}

/// Outcome of validating one candidate
#[derive(Debug)]
pub struct CandidateReport {
    pub index: usize,
    pub id: Option<String>,
    pub errors: Vec<FieldError>,
}

impl CandidateReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the validate command
pub async fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let registration = RegistrationConfig {
        default_area_code: args
            .default_area_code
            .unwrap_or(config.registration.default_area_code),
    };
    registration.validate()?;
    let area_code = registration.default_area_code;

    let value = super::read_json(&args.file)?;
    let candidates = parse_candidates(value)?;
    let reports = validate_all(candidates, &area_code);

    for report in &reports {
        let label = report.id.as_deref().unwrap_or("<no id>");

        if report.is_valid() {
            println!("[{}] {}: valid", report.index, label);
        } else {
            println!("[{}] {}: invalid", report.index, label);
            for error in &report.errors {
                println!("    {}", error);
            }
        }
    }

    let invalid = reports.iter().filter(|r| !r.is_valid()).count();
    info!(total = reports.len(), invalid, "Validation finished");

    if invalid > 0 {
        warn!(invalid, "Some candidates are invalid");
        anyhow::bail!("{} of {} candidates are invalid", invalid, reports.len());
    }

    Ok(())
}

/// Candidate field names as they appear in JSON
const CANDIDATE_FIELDS: [&str; 14] = [
    "id",
    "firstName",
    "lastName",
    "birthdate",
    "address",
    "postalCode",
    "email",
    "password",
    "areaCode",
    "phoneNumber",
    "termsAndConditions",
    "status",
    "roleId",
    "documentTypeId",
];

/// One entry of the input file; entries that fail to decode keep their error
#[derive(Debug)]
pub struct ParsedCandidate {
    pub id: Option<String>,
    pub candidate: Result<UserCandidate, FieldError>,
}

/// Accept either a single candidate object or an array of candidates.
///
/// Each entry is decoded on its own so one malformed entry does not hide the rest.
pub fn parse_candidates(value: Value) -> anyhow::Result<Vec<ParsedCandidate>> {
    match value {
        Value::Array(items) => Ok(items.into_iter().map(parse_candidate).collect()),
        Value::Object(_) => Ok(vec![parse_candidate(value)]),
        _ => anyhow::bail!("Expected a candidate object or an array of candidates"),
    }
}

fn parse_candidate(value: Value) -> ParsedCandidate {
    let Value::Object(fields) = value else {
        return ParsedCandidate {
            id: None,
            candidate: Err(FieldError::new(
                "candidate",
                FieldErrorKind::Malformed,
                "Expected a candidate object",
            )),
        };
    };

    let id = fields.get("id").and_then(Value::as_str).map(str::to_string);

    let candidate = serde_json::from_value(Value::Object(fields.clone())).map_err(|e| {
        FieldError::new(
            malformed_field(&fields),
            FieldErrorKind::Malformed,
            format!("Value has the wrong type or format: {}", e),
        )
    });

    ParsedCandidate { id, candidate }
}

/// Find the first field that cannot be decoded on its own
fn malformed_field(fields: &Map<String, Value>) -> &'static str {
    CANDIDATE_FIELDS
        .iter()
        .copied()
        .find(|name| {
            fields.get(*name).is_some_and(|value| {
                let mut single = Map::new();
                single.insert(name.to_string(), value.clone());
                serde_json::from_value::<UserCandidate>(Value::Object(single)).is_err()
            })
        })
        .unwrap_or("candidate")
}

pub fn validate_all(candidates: Vec<ParsedCandidate>, default_area_code: &str) -> Vec<CandidateReport> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(index, parsed)| {
            let errors = match parsed.candidate {
                Ok(candidate) => candidate
                    .with_default_area_code(default_area_code)
                    .validate()
                    .err()
                    .unwrap_or_default(),
                Err(error) => vec![error],
            };

            CandidateReport {
                index,
                id: parsed.id,
                errors,
            }
        })
        .collect()
}
