use pengadaan_core::policy::{acting_role, is_terminal, label_and_color, FlowVariant, Step};
use serde_json::json;

use crate::commands::CommandResult;

pub fn run(step: i64, partner: bool) -> CommandResult {
    let variant = if partner { FlowVariant::Partner } else { FlowVariant::OwnedBranch };
    let step = Step(step);
    let status = label_and_color(variant, step);

    let data = json!({
        "step": step,
        "variant": variant_name(variant),
        "label": status.label,
        "color_class": status.color_class,
        "acting_role": acting_role(variant, step).map(|role| role.label()),
        "terminal": is_terminal(variant, step),
    });

    CommandResult::success_with(
        "status",
        format!("step {step} resolves to `{}` for the {} flow", status.label, variant_name(variant)),
        data,
    )
}

fn variant_name(variant: FlowVariant) -> &'static str {
    match variant {
        FlowVariant::OwnedBranch => "owned-branch",
        FlowVariant::Partner => "partner",
    }
}
