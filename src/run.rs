// Run driver: sequences one full automation cycle. Everything before
// the first network call is local setup (output directories, the
// per-run log); after that the steps run in strict order and any hard
// failure aborts the run with a step-specific exit code.

use std::fs;
use std::io;
use std::path::Path;

use chrono::Local;
use thiserror::Error;

use crate::account::{self, resolve_account};
use crate::api::{ApiClient, ApiError, AuthError, DownloadError, SubmissionOutcome};
use crate::logging::RunLog;
use crate::profile::{resolve_profile, ProfileError};
use crate::store::DirStore;
use crate::ui;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not resolve an account id")]
    Account(#[source] io::Error),
    #[error("session exchange failed")]
    Auth(#[source] AuthError),
    #[error("fetching the current course failed")]
    CourseFetch(#[source] ApiError),
    #[error("resolving the group profile failed")]
    Profile(#[source] ProfileError),
    #[error("submitting the course completion failed")]
    Submission(#[source] ApiError),
    #[error("the platform rejected the course completion (status {status})")]
    SubmissionRejected { status: i64 },
    #[error("downloading the certificate failed")]
    Download(#[source] DownloadError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RunError {
    /// Stable exit codes so cron wrappers can tell the failure classes
    /// apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Account(_) | RunError::Io(_) => 1,
            RunError::Auth(_) => 2,
            RunError::CourseFetch(_) => 3,
            RunError::Submission(_) | RunError::SubmissionRejected { .. } => 4,
            RunError::Download(_) => 5,
            RunError::Profile(_) => 6,
        }
    }
}

/// One full automation cycle against `root`, the directory that holds
/// the cache files and receives logs/ and images/.
pub fn run(api: &ApiClient, root: &Path) -> Result<(), RunError> {
    let logs_dir = root.join("logs");
    let images_dir = root.join("images");
    fs::create_dir_all(&logs_dir)?;
    fs::create_dir_all(&images_dir)?;

    // one stamp for the whole run, shared by the log and the image
    let stamp = Local::now().format("%Y%m%d%H%M").to_string();
    let mut log = RunLog::create(&logs_dir.join(format!("{stamp}.log")))?;
    let mut store = DirStore::new(root);

    let account_id = resolve_account(
        std::env::var(account::OPENID_ENV).ok(),
        &mut store,
        &mut log,
        ui::prompt_account_id,
    )
    .map_err(RunError::Account)?;

    let sp = ui::spinner("Signing in...");
    let token = api.exchange(&account_id);
    sp.finish_and_clear();
    let token = token.map_err(RunError::Auth)?;
    log.info("obtained an access token");

    let course = api.current_course(&token).map_err(RunError::CourseFetch)?;
    log.info(&format!("current course id: {}", course.id));

    let profile = resolve_profile(&mut store, &mut log, || api.last_info(&token))
        .map_err(RunError::Profile)?;

    log.info("start the course");
    let sp = ui::spinner("Submitting completion...");
    let outcome = api.join(&token, &profile, &course.id);
    sp.finish_and_clear();
    let outcome = outcome.map_err(RunError::Submission)?;
    match outcome {
        SubmissionOutcome::Success => log.info("successfully completed the course"),
        SubmissionOutcome::Failure { status } => {
            log.info(&format!("failed to complete the course (status {status})"));
        }
    }

    let image_path = images_dir.join(format!("{stamp}.jpg"));
    api.download_certificate(&course.uri, &image_path)
        .map_err(RunError::Download)?;
    log.info(&format!("certificate saved to {}", image_path.display()));

    // the certificate is fetched either way; a rejected submission
    // still fails the run afterwards
    if let SubmissionOutcome::Failure { status } = outcome {
        return Err(RunError::SubmissionRejected { status });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_the_failure_classes() {
        let auth = RunError::Auth(AuthError::TokenMissing);
        let rejected = RunError::SubmissionRejected { status: 400 };
        let io = RunError::Io(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(auth.exit_code(), 2);
        assert_eq!(rejected.exit_code(), 4);
        assert_eq!(io.exit_code(), 1);
        assert_ne!(auth.exit_code(), rejected.exit_code());
    }
}
