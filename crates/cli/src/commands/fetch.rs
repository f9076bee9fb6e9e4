use pengadaan_client::HttpSubmissionGateway;
use pengadaan_core::config::{AppConfig, LoadOptions};
use pengadaan_core::gateway::{SubmissionGateway, INVALID_DATA_FORMAT};
use pengadaan_core::policy::label_and_color;
use pengadaan_core::token::Session;
use serde_json::json;

use crate::commands::CommandResult;

pub fn run(id: Option<&str>, branch: Option<u32>, token: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "fetch",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let session = match Session::from_token(token) {
        Ok(session) => session,
        Err(error) => return CommandResult::failure("fetch", "auth", error.to_string(), 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "fetch",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let gateway = HttpSubmissionGateway::from_config(&config);

    match id {
        Some(submission_id) => {
            let envelope = runtime.block_on(gateway.fetch_submission(&session, submission_id));
            if !envelope.is_success() {
                return CommandResult::failure(
                    "fetch",
                    "remote_error",
                    format!("backend returned {}: {}", envelope.status, envelope.message),
                    4,
                );
            }
            let Some(submission) = envelope.data else {
                return CommandResult::failure("fetch", "remote_error", INVALID_DATA_FORMAT, 4);
            };

            let status = label_and_color(submission.variant(), submission.step);
            let data = json!({
                "id": submission.id,
                "step": submission.step,
                "status": status.label,
                "origin_branch": submission.origin_branch,
                "destination_branch": submission.destination_branch,
                "items": submission.items.len(),
            });
            CommandResult::success_with(
                "fetch",
                format!("fetched submission {}", submission.id),
                data,
            )
        }
        None => {
            let envelope = runtime.block_on(gateway.list_submissions(&session, branch));
            if !envelope.is_success() {
                return CommandResult::failure(
                    "fetch",
                    "remote_error",
                    format!("backend returned {}: {}", envelope.status, envelope.message),
                    4,
                );
            }
            let Some(submissions) = envelope.data else {
                return CommandResult::failure("fetch", "remote_error", INVALID_DATA_FORMAT, 4);
            };

            let rows: Vec<_> = submissions
                .iter()
                .map(|submission| {
                    let status = label_and_color(submission.variant(), submission.step);
                    json!({
                        "id": submission.id,
                        "step": submission.step,
                        "status": status.label,
                    })
                })
                .collect();
            CommandResult::success_with(
                "fetch",
                format!("fetched {} submissions", rows.len()),
                json!(rows),
            )
        }
    }
}
