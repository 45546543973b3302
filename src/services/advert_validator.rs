use crate::dto::advert_dto::CreateAdvertPayload;
use crate::error::FieldError;
use crate::models::advert::{Advert, JobType};
use crate::utils::validation::{contains_email, is_valid_email, FieldErrors};

pub const MIN_PASSWORD_LENGTH: usize = 6;

const MSG_PASSWORD: &str = "Please enter a password";
const MSG_PASSWORD_LENGTH: &str = "Please ensure your password is at least 6 characters long";
const MSG_JOB_TITLE: &str = "Please specify a job title for this advert";
const MSG_JOB_TYPE: &str = "Please choose a job type for this advert";
const MSG_DESCRIPTION: &str = "Please ensure you give this advert a description";
const MSG_TELEPHONE: &str = "Please enter a telephone number";
const MSG_FORENAME: &str = "Please enter your first name";
const MSG_SURNAME: &str = "Please enter your surname";
const MSG_REFERENCE: &str =
    "Please supply a reference number of your choice to identify this advert";
const MSG_EMAIL: &str = "Your e-mail looks to be invalid to us. Please use an e-mail with the following format: name@name.co.uk";
const MSG_EMAIL_CONFIRMATION: &str =
    "Please ensure your e-mail address matches the confirmation field";
const MSG_PASSWORD_RETYPE: &str = "Please ensure your password matches the confirmation field";
const MSG_DESCRIPTION_EMAIL: &str = "Email addresses are not allowed in job description field.";

/// Field values checked on every save.
pub struct AdvertFields<'a> {
    pub reference: Option<&'a str>,
    pub job_title: Option<&'a str>,
    pub job_type: Option<&'a str>,
    pub description: Option<&'a str>,
    pub telephone: Option<&'a str>,
    pub submitters_forename: Option<&'a str>,
    pub submitters_surname: Option<&'a str>,
}

impl<'a> From<&'a Advert> for AdvertFields<'a> {
    fn from(advert: &'a Advert) -> Self {
        Self {
            reference: Some(&advert.reference),
            job_title: Some(&advert.job_title),
            job_type: Some(advert.job_type.as_str()),
            description: Some(&advert.description),
            telephone: Some(&advert.telephone),
            submitters_forename: Some(&advert.submitters_forename),
            submitters_surname: Some(&advert.submitters_surname),
        }
    }
}

impl<'a> From<&'a CreateAdvertPayload> for AdvertFields<'a> {
    fn from(payload: &'a CreateAdvertPayload) -> Self {
        Self {
            reference: payload.reference.as_deref(),
            job_title: payload.job_title.as_deref(),
            job_type: payload.job_type.as_deref(),
            description: payload.description.as_deref(),
            telephone: payload.telephone.as_deref(),
            submitters_forename: payload.submitters_forename.as_deref(),
            submitters_surname: payload.submitters_surname.as_deref(),
        }
    }
}

fn check_fields(errors: &mut FieldErrors, fields: &AdvertFields<'_>) {
    errors.require("job_title", fields.job_title, MSG_JOB_TITLE);

    let known_job_type = fields
        .job_type
        .is_some_and(|value| JobType::try_from(value.to_string()).is_ok());
    if !known_job_type {
        errors.add("job_type", MSG_JOB_TYPE);
    }

    errors.require("description", fields.description, MSG_DESCRIPTION);
    errors.require("telephone", fields.telephone, MSG_TELEPHONE);
    errors.require("submitters_forename", fields.submitters_forename, MSG_FORENAME);
    errors.require("submitters_surname", fields.submitters_surname, MSG_SURNAME);
    errors.require("reference", fields.reference, MSG_REFERENCE);
}

fn check_description(errors: &mut FieldErrors, description: Option<&str>) {
    if description.is_some_and(contains_email) {
        errors.add("description", MSG_DESCRIPTION_EMAIL);
    }
}

/// Everything a new submission must satisfy. Confirmation fields are only
/// compared when they were sent.
pub fn validate_submission(payload: &CreateAdvertPayload) -> Vec<FieldError> {
    let mut errors = FieldErrors::new();

    match payload.password.as_deref() {
        Some(password) if !password.is_empty() => {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                errors.add("password", MSG_PASSWORD_LENGTH);
            }
        }
        _ => errors.add("password", MSG_PASSWORD),
    }

    check_fields(&mut errors, &AdvertFields::from(payload));

    if !payload.email.as_deref().is_some_and(is_valid_email) {
        errors.add("email", MSG_EMAIL);
    }
    if let Some(confirmation) = payload.email_confirmation.as_deref() {
        if payload.email.as_deref() != Some(confirmation) {
            errors.add("email_confirmation", MSG_EMAIL_CONFIRMATION);
        }
    }
    if let Some(retype) = payload.password_retype.as_deref() {
        if payload.password.as_deref() != Some(retype) {
            errors.add("password_retype", MSG_PASSWORD_RETYPE);
        }
    }

    check_description(&mut errors, payload.description.as_deref());
    errors.into_vec()
}

/// Checks for an existing advert about to be saved again. Edits are checked
/// before they are applied, so `fields` may still hold raw input.
pub fn validate_record(fields: &AdvertFields<'_>) -> Vec<FieldError> {
    let mut errors = FieldErrors::new();
    check_fields(&mut errors, fields);
    check_description(&mut errors, fields.description);
    errors.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::advert::fixtures::advert;

    fn payload() -> CreateAdvertPayload {
        CreateAdvertPayload {
            reference: Some("CHEF-01".into()),
            job_title: Some("Head Chef".into()),
            job_type: Some("Permanent".into()),
            description: Some("Lead a busy kitchen team.".into()),
            telephone: Some("01632 960000".into()),
            submitters_forename: Some("Sam".into()),
            submitters_surname: Some("Taylor".into()),
            email: Some("sam@example.co.uk".into()),
            email_confirmation: Some("sam@example.co.uk".into()),
            password: Some("hunter22".into()),
            password_retype: Some("hunter22".into()),
            ..CreateAdvertPayload::default()
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn complete_submission_passes() {
        assert!(validate_submission(&payload()).is_empty());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = validate_submission(&CreateAdvertPayload::default());
        assert_eq!(
            fields(&errors),
            vec![
                "password",
                "job_title",
                "job_type",
                "description",
                "telephone",
                "submitters_forename",
                "submitters_surname",
                "reference",
                "email",
            ]
        );
        assert_eq!(errors[0].message, MSG_PASSWORD);
    }

    #[test]
    fn confirmations_must_match_when_given() {
        let mut submission = payload();
        submission.email_confirmation = Some("other@example.co.uk".into());
        submission.password_retype = Some("hunter23".into());
        assert_eq!(
            fields(&validate_submission(&submission)),
            vec!["email_confirmation", "password_retype"]
        );

        submission.email_confirmation = None;
        submission.password_retype = None;
        assert!(validate_submission(&submission).is_empty());
    }

    #[test]
    fn short_password_and_bad_email_rejected() {
        let mut submission = payload();
        submission.password = Some("abc".into());
        submission.password_retype = None;
        submission.email = Some("not-an-email".into());
        submission.email_confirmation = None;

        let errors = validate_submission(&submission);
        assert_eq!(fields(&errors), vec!["password", "email"]);
        assert_eq!(errors[0].message, MSG_PASSWORD_LENGTH);
    }

    #[test]
    fn unknown_job_type_rejected() {
        let mut submission = payload();
        submission.job_type = Some("Freelance".into());
        assert_eq!(fields(&validate_submission(&submission)), vec!["job_type"]);
    }

    #[test]
    fn description_must_not_carry_an_email() {
        let mut submission = payload();
        submission.description = Some("Send CVs to jobs@kitchen.co.uk".into());
        let errors = validate_submission(&submission);
        assert_eq!(fields(&errors), vec!["description"]);
        assert_eq!(errors[0].message, MSG_DESCRIPTION_EMAIL);

        let mut existing = advert();
        existing.description = "Email me: chef@kitchen.com".into();
        assert_eq!(fields(&validate_record(&AdvertFields::from(&existing))), vec!["description"]);
    }

    #[test]
    fn record_requires_non_blank_fields() {
        let mut existing = advert();
        assert!(validate_record(&AdvertFields::from(&existing)).is_empty());

        existing.telephone = "  ".into();
        existing.reference = String::new();
        assert_eq!(
            fields(&validate_record(&AdvertFields::from(&existing))),
            vec!["telephone", "reference"]
        );
    }

    #[test]
    fn record_reports_raw_job_type_with_other_errors() {
        let mut existing = advert();
        existing.telephone = String::new();
        let mut edited = AdvertFields::from(&existing);
        edited.job_type = Some("Freelance");

        let errors = validate_record(&edited);
        assert_eq!(fields(&errors), vec!["job_type", "telephone"]);
        assert_eq!(errors[0].message, MSG_JOB_TYPE);
    }
}
