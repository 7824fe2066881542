//! Lab orders as handed over by the host platform.

use serde::{Deserialize, Serialize};

/// Document kinds the hub can render for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "ABN")]
    Abn,
    #[serde(rename = "REQ")]
    Req,
    #[serde(rename = "AOE")]
    Aoe,
}

impl DocumentType {
    /// Every document type, in the order the hub expects them listed.
    pub const ALL: [DocumentType; 3] = [Self::Abn, Self::Req, Self::Aoe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abn => "ABN",
            Self::Req => "REQ",
            Self::Aoe => "AOE",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who pays for the order. Only third-party billing can require an ABN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingType {
    ThirdParty,
    Patient,
    Client,
    Other(String),
}

impl BillingType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "T" => Self::ThirdParty,
            "P" => Self::Patient,
            "C" => Self::Client,
            other => Self::Other(other.to_string()),
        }
    }
}

/// ABN flag recorded on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbnRequirement {
    NotRequired,
    Required,
    Other(String),
}

impl AbnRequirement {
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim() {
            "not_required" => Self::NotRequired,
            "required" => Self::Required,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Host-side identifiers and billing data for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub order_id: i64,
    pub patient_id: i64,
    pub billing_type: BillingType,
    pub abn: AbnRequirement,
}

/// An HL7-encoded order plus its metadata. The HL7 bytes are opaque here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabOrder {
    pub hl7: Vec<u8>,
    pub metadata: OrderMetadata,
}

impl LabOrder {
    pub fn new(hl7: impl Into<Vec<u8>>, metadata: OrderMetadata) -> Self {
        Self {
            hl7: hl7.into(),
            metadata,
        }
    }

    pub fn order_id(&self) -> i64 {
        self.metadata.order_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_serializes_as_hub_code() {
        let json = serde_json::to_string(&DocumentType::ALL).unwrap();
        assert_eq!(json, r#"["ABN","REQ","AOE"]"#);
    }

    #[test]
    fn test_billing_type_codes() {
        assert_eq!(BillingType::from_code("T"), BillingType::ThirdParty);
        assert_eq!(BillingType::from_code(" P "), BillingType::Patient);
        assert_eq!(BillingType::from_code("X"), BillingType::Other("X".into()));
    }

    #[test]
    fn test_abn_flag() {
        assert_eq!(AbnRequirement::from_flag("not_required"), AbnRequirement::NotRequired);
        assert_eq!(AbnRequirement::from_flag("required"), AbnRequirement::Required);
    }
}
