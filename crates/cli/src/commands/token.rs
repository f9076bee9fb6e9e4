use chrono::Utc;
use pengadaan_core::token;
use serde_json::json;

use crate::commands::CommandResult;

pub fn run(raw: &str) -> CommandResult {
    let Some(identity) = token::decode(raw) else {
        return CommandResult::failure(
            "token",
            "undecodable_token",
            "token is not a decodable three-segment bearer token",
            2,
        );
    };

    let valid = identity.is_valid_at(Utc::now());
    let data = json!({
        "role": identity.role,
        "branch_claim": identity.branch,
        "branch_effective": identity.branch_number(),
        "subject": identity.subject,
        "expires_at": identity.expires_at,
        "valid": valid,
    });

    let message =
        if valid { "token decoded and currently valid" } else { "token decoded but expired" };
    CommandResult::success_with("token", message, data)
}
