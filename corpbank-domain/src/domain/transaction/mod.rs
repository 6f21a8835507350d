use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrxDirection {
    Incoming,
    Outgoing,
}

impl Display for TrxDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let direction = match self {
            TrxDirection::Incoming => "INCOMING",
            TrxDirection::Outgoing => "OUTGOING",
        };
        write!(f, "{direction}")
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrxTransferMethod {
    Havale,
    Eft,
    Fast,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionAccount {
    pub bank_code: String,
    pub iban: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionParticipant {
    pub bank_code: String,
    pub iban: String,
    pub identity_number: String,
    pub name: String,
}

/// A bank transaction as pushed by the webhook notification.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub account: TransactionAccount,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub currency: String,
    pub direction: TrxDirection,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub received_at: DateTime<Utc>,
    #[serde(
        rename = "reference_code",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub ref_code: String,
    #[serde(rename = "transfer_type")]
    pub transfer_method: TrxTransferMethod,
    pub sender: Option<TransactionParticipant>,
    pub recipient: Option<TransactionParticipant>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deserialize_incoming_transaction() {
        let payload = r#"{
            "id": "0b6a7c4e-96a1-4f0c-8f65-3a3fa1b2c9d1",
            "date": "2024-03-01T11:58:00Z",
            "account": { "bank_code": "0062", "iban": "TR330006100519786457841326" },
            "amount": 1250.75,
            "currency": "TRY",
            "direction": "INCOMING",
            "description": "Invoice 2024-117",
            "received_at": "2024-03-01T11:59:30Z",
            "reference_code": "REF-117",
            "transfer_type": "FAST",
            "sender": {
                "bank_code": "0010",
                "iban": "TR320010009999901234567890",
                "identity_number": "11111111110",
                "name": "Jane Doe"
            },
            "recipient": null
        }"#;

        let trx = serde_json::from_str::<Transaction>(payload).unwrap();
        assert_eq!(trx.amount, Decimal::from_str("1250.75").unwrap());
        assert_eq!(trx.direction, TrxDirection::Incoming);
        assert_eq!(trx.transfer_method, TrxTransferMethod::Fast);
        assert_eq!(trx.ref_code, "REF-117");
        assert_eq!(trx.sender.unwrap().name, "Jane Doe");
        assert!(trx.recipient.is_none());
    }

    #[test]
    fn test_deserialize_tolerates_null_and_missing_text() {
        let payload = r#"{
            "id": "0b6a7c4e-96a1-4f0c-8f65-3a3fa1b2c9d1",
            "date": "2024-03-01T11:58:00Z",
            "account": { "bank_code": "0062", "iban": "TR330006100519786457841326" },
            "amount": "10.00",
            "currency": null,
            "direction": "OUTGOING",
            "received_at": "2024-03-01T11:59:30Z",
            "reference_code": null,
            "transfer_type": "EFT",
            "sender": null,
            "recipient": null
        }"#;

        let trx = serde_json::from_str::<Transaction>(payload).unwrap();
        assert_eq!(trx.currency, "");
        assert_eq!(trx.description, "");
        assert_eq!(trx.ref_code, "");
        assert_eq!(trx.direction, TrxDirection::Outgoing);
    }

    #[test]
    fn test_deserialize_rejects_unknown_direction() {
        let payload = r#"{
            "id": "0b6a7c4e-96a1-4f0c-8f65-3a3fa1b2c9d1",
            "date": "2024-03-01T11:58:00Z",
            "account": { "bank_code": "0062", "iban": "TR330006100519786457841326" },
            "amount": "10.00",
            "currency": "TRY",
            "direction": "SIDEWAYS",
            "description": "",
            "received_at": "2024-03-01T11:59:30Z",
            "reference_code": "",
            "transfer_type": "EFT",
            "sender": null,
            "recipient": null
        }"#;

        assert!(serde_json::from_str::<Transaction>(payload).is_err());
    }
}
