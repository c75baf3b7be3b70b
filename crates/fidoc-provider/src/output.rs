//! What a provider hands back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields extracted from a fiscal document.
///
/// Dates stay as the provider returned them; parsing (and rejecting) them is
/// the validator's job. Everything not covered by a named field goes into
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractedFields {
    /// Emitter CNPJ.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_cnpj: Option<String>,

    /// Recipient CNPJ.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_cnpj: Option<String>,

    /// Beneficiary CPF (payroll slips, receipts issued by individuals).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_cpf: Option<String>,

    /// Issue date (data de emissão).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,

    /// Due date (data de vencimento).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    /// Gross total (valor total).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    /// Net amount after deductions (valor líquido).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,

    /// 44-digit NFe access key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Document number as printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,

    /// Document-specific payload.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ExtractedFields {
    /// Check if no field was extracted at all.
    pub fn is_empty(&self) -> bool {
        self.issuer_cnpj.is_none()
            && self.recipient_cnpj.is_none()
            && self.beneficiary_cpf.is_none()
            && self.issue_date.is_none()
            && self.due_date.is_none()
            && self.total_amount.is_none()
            && self.net_amount.is_none()
            && self.access_key.is_none()
            && self.document_number.is_none()
            && self.extra.is_empty()
    }
}

/// Result of one provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutput {
    /// Full recognized text.
    pub raw_text: String,

    /// Structured fields.
    pub fields: ExtractedFields,

    /// Provider's own confidence (0.0 - 1.0).
    pub provider_confidence: f32,

    /// Pages the provider actually processed, if it reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_processed: Option<u32>,

    /// Amount the provider billed, if it reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<Decimal>,
}
