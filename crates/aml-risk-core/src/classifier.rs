//! Free-text classification of movements and payment methods.
//!
//! Keyword matching is inherently locale bound, so the vocabulary lives in a
//! swappable [`KeywordTable`] behind the [`MovementClassifier`] trait. The
//! default table covers the Italian causali used by the gaming operator plus
//! their English equivalents.

use serde::{Deserialize, Serialize};

/// Fallback payment method when neither the hint nor the reason match.
pub const OTHER_METHOD: &str = "Other";

/// What a movement represents, derived from its reason text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
    WithdrawalCancellation,
    /// Game play, bonuses and anything else; excluded from volume math.
    Other,
}

/// Pluggable classification strategy.
pub trait MovementClassifier: Send + Sync {
    fn classify(&self, reason: Option<&str>) -> MovementKind;

    /// Normalised payment method from the hint, falling back to the reason.
    fn payment_method(&self, hint: Option<&str>, reason: Option<&str>) -> String;

    fn mentions_bonus(&self, reason: Option<&str>) -> bool;

    /// Whether the reason indicates a live-dealer session.
    fn mentions_live(&self, reason: Option<&str>) -> bool;
}

/// Vocabulary driving [`KeywordClassifier`]. Matching is substring based and
/// case-insensitive, except `live` keywords which must stand as whole words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub deposit: Vec<String>,
    pub withdrawal: Vec<String>,
    pub cancellation: Vec<String>,
    pub bonus: Vec<String>,
    pub live: Vec<String>,
    /// Ordered cascade of (method name, keywords); first match wins.
    pub payment_methods: Vec<(String, Vec<String>)>,
}

impl KeywordTable {
    /// Italian gaming causali with English equivalents.
    pub fn italian() -> Self {
        Self {
            deposit: words(&[
                "ricarica",
                "deposito",
                "deposit",
                "recharge",
                "versamento",
                "top up",
                "top-up",
            ]),
            withdrawal: words(&["prelievo", "prelevamento", "withdraw", "payout"]),
            cancellation: words(&[
                "annull",
                "storno",
                "stornato",
                "rimborso",
                "revoca",
                "refund",
                "chargeback",
                "cancel",
                "reversal",
            ]),
            bonus: words(&["bonus"]),
            live: words(&["live", "dal vivo"]),
            payment_methods: vec![
                method("PayPal", &["paypal"]),
                method("Skrill", &["skrill", "moneybookers"]),
                method("Neteller", &["neteller"]),
                method("Paysafecard", &["paysafe"]),
                method("PostePay", &["postepay"]),
                method("Apple Pay", &["apple pay", "applepay"]),
                method("Google Pay", &["google pay", "gpay"]),
                method(
                    "Carta",
                    &["visa", "mastercard", "maestro", "amex", "carta", "card"],
                ),
                method("Bonifico", &["bonifico", "bank transfer", "sepa", "iban", "wire"]),
                method("Contanti", &["contanti", "cash", "punto vendita", "agenzia"]),
            ],
        }
    }

    /// Lowercase every keyword so matching only needs to lowercase the input.
    fn normalized(mut self) -> Self {
        for list in [
            &mut self.deposit,
            &mut self.withdrawal,
            &mut self.cancellation,
            &mut self.bonus,
            &mut self.live,
        ] {
            lowercase_all(list);
        }
        for (_, keywords) in &mut self.payment_methods {
            lowercase_all(keywords);
        }
        self
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::italian()
    }
}

/// Keyword-table backed classifier.
#[derive(Clone, Debug)]
pub struct KeywordClassifier {
    table: KeywordTable,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(KeywordTable::italian())
    }
}

impl KeywordClassifier {
    pub fn new(table: KeywordTable) -> Self {
        Self {
            table: table.normalized(),
        }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    fn method_in(&self, text: &str) -> Option<&str> {
        self.table
            .payment_methods
            .iter()
            .find(|(_, keywords)| contains_any(text, keywords))
            .map(|(name, _)| name.as_str())
    }
}

impl MovementClassifier for KeywordClassifier {
    fn classify(&self, reason: Option<&str>) -> MovementKind {
        let Some(text) = lowered(reason) else {
            return MovementKind::Other;
        };

        // Order matters: a deposit keyword always wins, then cancellations
        // of withdrawals, then plain withdrawals.
        if contains_any(&text, &self.table.deposit) {
            MovementKind::Deposit
        } else if contains_any(&text, &self.table.withdrawal) {
            if contains_any(&text, &self.table.cancellation) {
                MovementKind::WithdrawalCancellation
            } else {
                MovementKind::Withdrawal
            }
        } else {
            MovementKind::Other
        }
    }

    fn payment_method(&self, hint: Option<&str>, reason: Option<&str>) -> String {
        lowered(hint)
            .as_deref()
            .and_then(|text| self.method_in(text))
            .or_else(|| lowered(reason).as_deref().and_then(|text| self.method_in(text)))
            .unwrap_or(OTHER_METHOD)
            .to_string()
    }

    fn mentions_bonus(&self, reason: Option<&str>) -> bool {
        lowered(reason).is_some_and(|text| contains_any(&text, &self.table.bonus))
    }

    fn mentions_live(&self, reason: Option<&str>) -> bool {
        lowered(reason).is_some_and(|text| contains_any_word(&text, &self.table.live))
    }
}

fn lowered(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| !kw.is_empty() && text.contains(kw.as_str()))
}

/// Like [`contains_any`], but a hit must not touch a letter or digit on either side.
fn contains_any_word(text: &str, keywords: &[String]) -> bool {
    keywords.iter().filter(|kw| !kw.is_empty()).any(|kw| {
        text.match_indices(kw.as_str()).any(|(start, hit)| {
            let before = text[..start].chars().next_back();
            let after = text[start + hit.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    })
}

fn lowercase_all(list: &mut [String]) {
    for keyword in list.iter_mut() {
        *keyword = keyword.to_lowercase();
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn method(name: &str, keywords: &[&str]) -> (String, Vec<String>) {
    (name.to_string(), words(keywords))
}
