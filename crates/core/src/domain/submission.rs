//! Wire-facing procurement entities. Field names mirror the backend payloads
//! exactly; everything here is an ephemeral, server-owned copy held only for
//! the lifetime of a screen.

use serde::{Deserialize, Deserializer, Serialize};

use crate::money::Money;
use crate::policy::{FlowVariant, Step};

/// A procurement request as fetched from `tabel-pengadaan/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "idPengajuan", deserialize_with = "lenient_string")]
    pub id: String,
    pub step: Step,
    #[serde(rename = "waktuPengajuan")]
    pub submitted_at: String,
    #[serde(rename = "nomorCabangAsal")]
    pub origin_branch: u32,
    #[serde(rename = "nomorCabangTujuan")]
    pub destination_branch: u32,
    /// `true` marks the owned-branch flow, `false` the partner flow.
    #[serde(rename = "flag")]
    pub owned_branch: bool,
    #[serde(rename = "listBarang", default)]
    pub items: Vec<LineItem>,
}

impl Submission {
    pub fn variant(&self) -> FlowVariant {
        FlowVariant::from_flag(self.owned_branch)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "kodeBarang", deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(rename = "namaBarang")]
    pub name: String,
    #[serde(rename = "hargaSatuan")]
    pub unit_price: Money,
    #[serde(rename = "stokCabangSaatIni")]
    pub branch_stock: i64,
    #[serde(rename = "stokInput")]
    pub input_qty: i64,
    #[serde(rename = "stokPusatSaatIni")]
    pub central_stock: i64,
}

/// One row of the per-branch stock snapshot from `get-stock/{branch}`.
/// Fetched fresh per screen; never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "kodeBarang", deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(rename = "namaBarang")]
    pub name: String,
    #[serde(rename = "hargaSatuan")]
    pub unit_price: Money,
    #[serde(rename = "stokSaatIni")]
    pub current_stock: i64,
    #[serde(rename = "stokPusatSaatIni", default)]
    pub central_stock: i64,
}

/// An uncommitted item/quantity row queued on a screen. Has no identity
/// beyond its position until a submit action persists the batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRow {
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PendingRow {
    pub fn to_input(&self) -> StockInput {
        StockInput { code: self.code.clone(), quantity: self.quantity }
    }
}

/// Body for both `add-stock` and the reduction endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockBatch {
    #[serde(rename = "nomorCabang")]
    pub branch: u32,
    #[serde(rename = "listInputBarang")]
    pub items: Vec<StockInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockInput {
    #[serde(rename = "kodeBarang")]
    pub code: String,
    #[serde(rename = "stokInput")]
    pub quantity: i64,
}

/// Body for the per-role decision endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    #[serde(rename = "idPengajuan")]
    pub submission_id: String,
    #[serde(rename = "nomorCabang")]
    pub branch: u32,
    #[serde(rename = "status")]
    pub approve: bool,
    #[serde(rename = "keterangan")]
    pub remark: String,
}

/// Item ids arrive as strings in some payloads and bare integers in others.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}
