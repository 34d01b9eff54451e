use crate::infra::{InMemoryReportStore, LoggingNotifier};
use chrono::{Duration, Utc};
use clap::Args;
use crimetrack::error::AppError;
use crimetrack::reports::{
    AdminId, AdmissionPolicy, DayBoundary, ReportService, ReportServiceError, ReportStatus,
    ReportSubmission,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Submitter mobile number used for the demo reports (10 digits)
    #[arg(long, default_value = "9876543210")]
    pub(crate) mobile: String,
}

/// Walk one report through the full lifecycle against in-memory
/// infrastructure, printing every step and every SMS the service would send.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryReportStore::default());
    let notifier = Arc::new(LoggingNotifier::default());
    let policy = AdmissionPolicy::new(3, Duration::hours(8), DayBoundary::Local);
    let service = ReportService::new(store, notifier.clone(), policy);

    let submission = ReportSubmission {
        mobile_number: args.mobile.clone(),
        crime_type: "Theft".to_string(),
        description: "Bike stolen from the market square rack".to_string(),
        latitude: 17.3850,
        longitude: 78.4867,
        address: Some("Market Square".to_string()),
        submitter_verified: true,
    };

    let now = Utc::now();
    let receipt = service
        .submit_at(submission.clone(), now)
        .map_err(AppError::from)?;
    println!(
        "submitted report {} (short code {})",
        receipt.report_id.0, receipt.short_code
    );

    match service.submit_at(submission, now + Duration::minutes(5)) {
        Err(ReportServiceError::RateLimit(denied)) => {
            println!("second submission rejected as expected: {denied}");
        }
        Ok(_) => println!("second submission unexpectedly admitted"),
        Err(other) => return Err(AppError::from(other)),
    }

    let verified = service
        .review(
            &receipt.report_id,
            AdminId("demo-admin".to_string()),
            ReportStatus::Verified,
            Some("confirmed by patrol".to_string()),
        )
        .map_err(AppError::from)?;
    println!("report verified at {:?}", verified.verified_at);

    let resolved = service
        .review(
            &receipt.report_id,
            AdminId("demo-admin".to_string()),
            ReportStatus::Resolved,
            Some("case closed".to_string()),
        )
        .map_err(AppError::from)?;
    println!("report resolved with notes {:?}", resolved.admin_notes);

    service.flush_notifications();
    println!("-- sms log --");
    for (to, message) in notifier.sent() {
        println!("[{}] {}", to.as_str(), message.body);
    }

    Ok(())
}
