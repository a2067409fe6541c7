//! Simulated local payment flow
//!
//! No money moves. The gateway walks the same steps a real wallet or card
//! charge would report, waits a fixed delay on each, then approves or
//! declines at random.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::value_objects::Money;
use crate::error::{MarketError, Result};
use crate::forms::is_pk_mobile;

pub const DECLINED_MESSAGE: &str = "Payment failed. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { Easypaisa, Jazzcash, Card, Cod }

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Easypaisa => "easypaisa", Self::Jazzcash => "jazzcash", Self::Card => "card", Self::Cod => "cod" }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Easypaisa => "Easypaisa", Self::Jazzcash => "JazzCash",
            Self::Card => "Credit/Debit Card", Self::Cod => "Cash on Delivery",
        }
    }

    /// Cash on delivery is collected by the courier, so the order is not paid yet.
    pub fn settles_now(&self) -> bool { !matches!(self, Self::Cod) }
}

/// Whatever the shopper typed for the chosen method; unused fields stay empty.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaymentDetails {
    pub phone: Option<String>,
    pub otp: Option<String>,
    pub card_number: Option<String>,
    pub expiry: Option<String>,
    pub cvv: Option<String>,
    pub card_name: Option<String>,
    pub name: Option<String>,
}

fn filled(v: &Option<String>) -> Option<&str> { v.as_deref().map(str::trim).filter(|s| !s.is_empty()) }

fn digits(v: &str) -> String { v.chars().filter(|c| !c.is_whitespace() && *c != '-').collect() }

fn all_digits(v: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&v.len()) && v.chars().all(|c| c.is_ascii_digit())
}

fn valid_expiry(v: &str) -> bool {
    let Some((mm, yy)) = v.split_once('/') else { return false };
    let month_ok = all_digits(mm, 2, 2) && mm.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));
    month_ok && all_digits(yy, 2, 2)
}

pub fn validate_details(method: PaymentMethod, details: &PaymentDetails) -> Result<()> {
    let mut missing = vec![];
    match method {
        PaymentMethod::Easypaisa | PaymentMethod::Jazzcash => {
            let (Some(phone), Some(otp)) = (filled(&details.phone), filled(&details.otp)) else {
                if filled(&details.phone).is_none() { missing.push("phone"); }
                if filled(&details.otp).is_none() { missing.push("otp"); }
                return Err(MarketError::MissingFields(missing.into_iter().map(String::from).collect()));
            };
            if !is_pk_mobile(phone) {
                return Err(MarketError::Validation(format!("Enter a valid {} mobile number (03XX XXXXXXX)", method.label())));
            }
            if !all_digits(otp, 6, 6) { return Err(MarketError::Validation("OTP must be 6 digits".into())); }
        }
        PaymentMethod::Card => {
            for (field, value) in [("card_number", &details.card_number), ("expiry", &details.expiry), ("cvv", &details.cvv), ("card_name", &details.card_name)] {
                if filled(value).is_none() { missing.push(field); }
            }
            if !missing.is_empty() {
                return Err(MarketError::MissingFields(missing.into_iter().map(String::from).collect()));
            }
            let number = digits(filled(&details.card_number).unwrap_or_default());
            if !all_digits(&number, 13, 19) { return Err(MarketError::Validation("Card number must be 13 to 19 digits".into())); }
            if !valid_expiry(filled(&details.expiry).unwrap_or_default()) {
                return Err(MarketError::Validation("Expiry must be MM/YY".into()));
            }
            if !all_digits(filled(&details.cvv).unwrap_or_default(), 3, 4) {
                return Err(MarketError::Validation("CVV must be 3 or 4 digits".into()));
            }
        }
        PaymentMethod::Cod => {
            if filled(&details.name).is_none() { missing.push("name"); }
            if filled(&details.phone).is_none() { missing.push("phone"); }
            if !missing.is_empty() {
                return Err(MarketError::MissingFields(missing.into_iter().map(String::from).collect()));
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStep { ValidatingMethod, ProcessingPayment, VerifyingTransaction, ConfirmingOrder }

impl PaymentStep {
    pub const ALL: [PaymentStep; 4] = [Self::ValidatingMethod, Self::ProcessingPayment, Self::VerifyingTransaction, Self::ConfirmingOrder];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ValidatingMethod => "Validating payment method...",
            Self::ProcessingPayment => "Processing payment...",
            Self::VerifyingTransaction => "Verifying transaction...",
            Self::ConfirmingOrder => "Confirming order...",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub method: PaymentMethod,
    pub amount: Money,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub steps: Vec<PaymentStep>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, method: PaymentMethod, amount: Money) -> Result<PaymentReceipt>;
}

#[derive(Clone, Debug)]
pub struct MockGateway {
    step_delay: Duration,
    success_rate: f64,
}

impl Default for MockGateway {
    fn default() -> Self { Self::new(Duration::from_millis(1000), 0.9) }
}

impl MockGateway {
    pub fn new(step_delay: Duration, success_rate: f64) -> Self {
        Self { step_delay, success_rate: success_rate.clamp(0.0, 1.0) }
    }

    pub fn success_rate(&self) -> f64 { self.success_rate }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(&self, method: PaymentMethod, amount: Money) -> Result<PaymentReceipt> {
        for step in PaymentStep::ALL {
            tracing::info!(method = method.as_str(), amount = %amount, step = step.label(), "payment step");
            tokio::time::sleep(self.step_delay).await;
        }
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        if !approved {
            tracing::warn!(method = method.as_str(), amount = %amount, "payment declined");
            return Err(MarketError::PaymentDeclined(DECLINED_MESSAGE.into()));
        }
        let timestamp = Utc::now();
        Ok(PaymentReceipt {
            method, amount, transaction_id: format!("TXN{}", timestamp.timestamp_millis()), timestamp, steps: PaymentStep::ALL.to_vec(),
        })
    }
}
