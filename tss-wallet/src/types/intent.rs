//! Payment intents used to create transaction requests.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
#[non_exhaustive]
pub enum IntentType {
    Payment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    /// Amount in base units, as a base-10 integer string.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub value: String,
    #[serde(rename = "type")]
    pub memo_type: String,
}

/// Caller-facing description of a payment to prebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebuildParams {
    pub recipients: Vec<Recipient>,
    pub memo: Option<Memo>,
    pub intent_type: IntentType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentAddress {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentAmount {
    pub value: String,
    pub asset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRecipient {
    pub address: IntentAddress,
    pub amount: IntentAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub intent_type: IntentType,
    pub recipients: Vec<IntentRecipient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Body of a create-transaction-request call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub intent: Intent,
}

impl IntentRequest {
    /// Translate caller parameters into the wire intent, denominating every
    /// amount in `coin`.
    pub fn from_params(params: &PrebuildParams, coin: &str) -> Self {
        let recipients = params
            .recipients
            .iter()
            .map(|recipient| IntentRecipient {
                address: IntentAddress {
                    address: recipient.address.clone(),
                },
                amount: IntentAmount {
                    value: recipient.amount.clone(),
                    asset: coin.to_string(),
                },
            })
            .collect();

        Self {
            intent: Intent {
                intent_type: params.intent_type,
                recipients,
                memo: params.memo.as_ref().map(|memo| memo.value.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_recipient_intent_matches_wire_format() {
        let params = PrebuildParams {
            recipients: vec![Recipient {
                address: "recipient".to_string(),
                amount: "10000".to_string(),
            }],
            memo: None,
            intent_type: IntentType::Payment,
        };

        let request = IntentRequest::from_params(&params, "tsol");
        let expected = json!({
            "intent": {
                "intentType": "payment",
                "recipients": [{
                    "address": { "address": "recipient" },
                    "amount": { "value": "10000", "asset": "tsol" }
                }]
            }
        });
        assert_eq!(serde_json::to_value(&request).unwrap(), expected);
    }

    #[test]
    fn memo_is_sent_as_plain_value() {
        let params = PrebuildParams {
            recipients: vec![
                Recipient {
                    address: "recipient1".to_string(),
                    amount: "10000".to_string(),
                },
                Recipient {
                    address: "recipient2".to_string(),
                    amount: "20000".to_string(),
                },
            ],
            memo: Some(Memo {
                value: "memo".to_string(),
                memo_type: "text".to_string(),
            }),
            intent_type: IntentType::Payment,
        };

        let request = IntentRequest::from_params(&params, "tsol");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["intent"]["memo"], "memo");
        assert_eq!(json["intent"]["recipients"][1]["amount"]["value"], "20000");
    }
}
