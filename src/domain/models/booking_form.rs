use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Gcash,
    Paymaya,
    BankTransfer,
    CreditCard,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Paymaya => "paymaya",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CreditCard => "credit_card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcash" => Ok(PaymentMethod::Gcash),
            "paymaya" | "maya" => Ok(PaymentMethod::Paymaya),
            "bank_transfer" | "bank" => Ok(PaymentMethod::BankTransfer),
            "credit_card" | "card" => Ok(PaymentMethod::CreditCard),
            other => Err(format!("Unsupported payment method '{}'", other)),
        }
    }
}

/// An uploaded proof-of-payment. Lives only in memory; never persisted in a snapshot.
#[derive(Clone, PartialEq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ReceiptFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Everything the booking wizard collects across its steps.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BookingFormData {
    pub wedding_date: Option<NaiveDate>,
    pub wedding_time: Option<NaiveTime>,
    pub venue: String,
    pub special_requests: String,
    pub payment_method: Option<PaymentMethod>,
    pub payment_amount: Option<f64>,
    #[serde(skip)]
    pub receipt: Option<ReceiptFile>,
    pub accept_terms: bool,
    pub accept_privacy: bool,
    pub marketing_opt_in: bool,
}

impl BookingFormData {
    pub fn has_receipt(&self) -> bool {
        self.receipt.as_ref().is_some_and(|r| !r.bytes.is_empty())
    }

    /// Copy of the form without the receipt handle, as written to a pending snapshot.
    pub fn without_receipt(&self) -> Self {
        Self {
            receipt: None,
            ..self.clone()
        }
    }
}

/// A fully validated booking request, ready for transport.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingSubmission {
    pub package_id: i64,
    pub wedding_date: NaiveDate,
    pub wedding_time: Option<NaiveTime>,
    pub venue: String,
    pub special_requests: String,
    pub payment_method: PaymentMethod,
    pub payment_amount: f64,
    pub accept_terms: bool,
    pub accept_privacy: bool,
    pub marketing_opt_in: bool,
    pub receipt: ReceiptFile,
}

impl BookingSubmission {
    /// Text parts of the multipart payload. Numbers and booleans go over the wire as strings.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("wedding_date", self.wedding_date.format("%Y-%m-%d").to_string()),
            ("venue", self.venue.clone()),
            ("special_requests", self.special_requests.clone()),
            ("payment_method", self.payment_method.as_str().to_string()),
            ("payment_amount", self.payment_amount.to_string()),
            ("accept_terms", self.accept_terms.to_string()),
            ("accept_privacy", self.accept_privacy.to_string()),
            ("marketing_opt_in", self.marketing_opt_in.to_string()),
        ];
        if let Some(time) = self.wedding_time {
            fields.push(("wedding_time", time.format("%H:%M").to_string()));
        }
        fields
    }
}
