use super::domain::{Location, MobileNumber, ReportSubmission};

/// Validation errors raised while admitting a raw submission into the domain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("submitter mobile number has not completed OTP verification")]
    UnverifiedSubmitter,
    #[error("mobile number must be exactly 10 digits")]
    InvalidMobileNumber,
    #[error("crime type is required")]
    MissingCrimeType,
    #[error("description is required")]
    MissingDescription,
    #[error("coordinates out of range or not finite (lat {latitude}, lng {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// Checked pieces of a submission, ready for admission control and persistence.
#[derive(Debug, Clone)]
pub struct CheckedSubmission {
    pub submitter: MobileNumber,
    pub crime_type: String,
    pub description: String,
    pub location: Location,
}

/// Guard turning inbound submissions into checked domain values.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard;

impl SubmissionGuard {
    /// Validate shape only; rate limiting happens after this, against the
    /// submitter's stored history.
    pub fn check(&self, submission: ReportSubmission) -> Result<CheckedSubmission, ValidationError> {
        if !submission.submitter_verified {
            return Err(ValidationError::UnverifiedSubmitter);
        }

        let submitter = MobileNumber::new(&submission.mobile_number)
            .ok_or(ValidationError::InvalidMobileNumber)?;

        let crime_type = submission.crime_type.trim().to_string();
        if crime_type.is_empty() {
            return Err(ValidationError::MissingCrimeType);
        }

        let description = submission.description.trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }

        let latitude = submission.latitude;
        let longitude = submission.longitude;
        let in_range = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !in_range {
            return Err(ValidationError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        let address = submission
            .address
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(CheckedSubmission {
            submitter,
            crime_type,
            description,
            location: Location {
                latitude,
                longitude,
                address,
            },
        })
    }
}
