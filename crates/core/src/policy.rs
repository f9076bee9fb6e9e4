//! Approval-step policy.
//!
//! A submission carries an opaque numeric `step` code whose meaning depends
//! on the flow variant. The owned-branch flow and the partner flow reuse the
//! same integers with different terminal semantics, so each variant gets its
//! own lookup table. The tables are deliberately kept apart; unifying them
//! would silently change which steps count as terminal.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::LineItem;

/// Opaque step code. The wire delivers it as either an integer or a numeric
/// string; both parse to the same value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Step(pub i64);

impl Step {
    pub const REJECTED: Step = Step(0);
    pub const HR_APPROVAL: Step = Step(1);
    pub const FINANCE_APPROVAL: Step = Step(2);
    pub const WAREHOUSE_CONFIRMATION: Step = Step(3);
    pub const BRANCH_HEAD_CONFIRMATION: Step = Step(4);
    pub const COMPLETE: Step = Step(5);
    pub const PENDING_CENTRAL_STOCK: Step = Step(6);
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StepVisitor)
    }
}

struct StepVisitor;

impl Visitor<'_> for StepVisitor {
    type Value = Step;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer step code or its string form")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Step, E> {
        Ok(Step(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Step, E> {
        i64::try_from(value).map(Step).map_err(|_| E::custom("step code out of range"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Step, E> {
        value
            .trim()
            .parse::<i64>()
            .map(Step)
            .map_err(|_| E::custom(format!("unparseable step code `{value}`")))
    }
}

/// The two procurement flows. `flag: true` on a submission marks the
/// owned-branch (cabang asli) flow, `false` the partner (kerja sama) flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    OwnedBranch,
    Partner,
}

impl FlowVariant {
    pub fn from_flag(owned_branch: bool) -> Self {
        if owned_branch {
            Self::OwnedBranch
        } else {
            Self::Partner
        }
    }
}

/// Roles that appear in the approval chain. Matching is exact on the labels
/// the backend uses; no normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    HrDepartmentHead,
    FinanceStaff,
    WarehouseStaff,
    BranchHead,
}

impl Role {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Kepala Departemen SDM dan Umum" => Some(Self::HrDepartmentHead),
            "Staf keuangan" => Some(Self::FinanceStaff),
            "Staf Gudang Pelaksana Umum" => Some(Self::WarehouseStaff),
            "Kepala Operasional Cabang" => Some(Self::BranchHead),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HrDepartmentHead => "Kepala Departemen SDM dan Umum",
            Self::FinanceStaff => "Staf keuangan",
            Self::WarehouseStaff => "Staf Gudang Pelaksana Umum",
            Self::BranchHead => "Kepala Operasional Cabang",
        }
    }

    pub fn screen_path(self, submission_id: &str) -> String {
        match self {
            Self::HrDepartmentHead => format!("/pengadaan/persetujuan-sdm/{submission_id}"),
            Self::FinanceStaff => format!("/pengadaan/persetujuan-keuangan/{submission_id}"),
            Self::WarehouseStaff => format!("/pengadaan/konfirmasi-gudang/{submission_id}"),
            Self::BranchHead => format!("/pengadaan/konfirmasi-kepala-cabang/{submission_id}"),
        }
    }
}

/// Owned-branch table: 0 rejected, 1 HR head, 2 finance staff, 3 warehouse
/// staff, 4 branch head, 5 complete, 6 pending on central stock.
/// Partner table: same integers up to 2, but 3 is the completion terminal
/// and 4/5 do not occur.
pub fn acting_role(variant: FlowVariant, step: Step) -> Option<Role> {
    match (variant, step) {
        (_, Step::HR_APPROVAL) => Some(Role::HrDepartmentHead),
        (_, Step::FINANCE_APPROVAL) => Some(Role::FinanceStaff),
        (FlowVariant::OwnedBranch, Step::WAREHOUSE_CONFIRMATION) => Some(Role::WarehouseStaff),
        (FlowVariant::OwnedBranch, Step::BRANCH_HEAD_CONFIRMATION) => Some(Role::BranchHead),
        _ => None,
    }
}

pub fn is_terminal(variant: FlowVariant, step: Step) -> bool {
    match variant {
        FlowVariant::OwnedBranch => matches!(step, Step::REJECTED | Step::COMPLETE),
        FlowVariant::Partner => matches!(step, Step::REJECTED | Step::WAREHOUSE_CONFIRMATION),
    }
}

/// Exact role match against the step table, with one hard business rule
/// layered on top: at the HR step, any line item requesting more than the
/// central warehouse currently holds blocks approval for every role.
pub fn can_approve(variant: FlowVariant, step: Step, role: &str, items: &[LineItem]) -> bool {
    if step == Step::HR_APPROVAL && items.iter().any(|item| item.input_qty > item.central_stock) {
        return false;
    }
    acting_role(variant, step).map(|required| required.label() == role).unwrap_or(false)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Navigate to the role's screen for this submission.
    Screen(String),
    /// Terminal submission and no recognized role: show a message, stay put.
    NoAction(String),
    /// Unrecognized role on a live submission: unauthorized screen.
    Unauthorized,
}

pub fn route_for(variant: FlowVariant, step: Step, role: &str, submission_id: &str) -> RouteOutcome {
    match Role::from_label(role) {
        Some(known) => RouteOutcome::Screen(known.screen_path(submission_id)),
        None if is_terminal(variant, step) => {
            RouteOutcome::NoAction("Tidak ada tindakan untuk pengajuan ini".to_owned())
        }
        None => RouteOutcome::Unauthorized,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub label: &'static str,
    pub color_class: &'static str,
}

const UNKNOWN_STATUS: StepStatus =
    StepStatus { label: "Status Tidak Diketahui", color_class: "bg-gray-400" };

pub fn label_and_color(variant: FlowVariant, step: Step) -> StepStatus {
    match (variant, step) {
        (_, Step::REJECTED) => StepStatus { label: "Ditolak", color_class: "bg-red-500" },
        (_, Step::HR_APPROVAL) => StepStatus {
            label: "Menunggu Persetujuan Kepala Departemen SDM dan Umum",
            color_class: "bg-yellow-500",
        },
        (_, Step::FINANCE_APPROVAL) => StepStatus {
            label: "Menunggu Persetujuan Staf Keuangan",
            color_class: "bg-yellow-500",
        },
        (FlowVariant::OwnedBranch, Step::WAREHOUSE_CONFIRMATION) => StepStatus {
            label: "Menunggu Konfirmasi Staf Gudang",
            color_class: "bg-sky-500",
        },
        (FlowVariant::Partner, Step::WAREHOUSE_CONFIRMATION) => {
            StepStatus { label: "Selesai", color_class: "bg-green-500" }
        }
        (FlowVariant::OwnedBranch, Step::BRANCH_HEAD_CONFIRMATION) => StepStatus {
            label: "Menunggu Konfirmasi Kepala Operasional Cabang",
            color_class: "bg-sky-500",
        },
        (FlowVariant::OwnedBranch, Step::COMPLETE) => {
            StepStatus { label: "Selesai", color_class: "bg-green-500" }
        }
        (_, Step::PENDING_CENTRAL_STOCK) => StepStatus {
            label: "Tertunda - Stok Pusat Tidak Mencukupi",
            color_class: "bg-orange-500",
        },
        _ => UNKNOWN_STATUS,
    }
}
