//! Word lists used by the field classifier.

/// Vocabulary of one category.
pub(crate) struct Vocabulary {
    /// Field names that match as a whole.
    pub exact: &'static [&'static str],
    /// Name or label words that count as a hit.
    pub words: &'static [&'static str],
}

impl Vocabulary {
    /// Score a field: 3 for an exact name, plus 1 per matching word.
    pub fn score(&self, name: &str, tokens: &[String]) -> u32 {
        let exact = if self.exact.contains(&name) { 3 } else { 0 };
        let hits = tokens
            .iter()
            .filter(|t| self.words.contains(&t.as_str()))
            .count() as u32;
        exact + hits
    }
}

pub(crate) const IDENTITY: Vocabulary = Vocabulary {
    exact: &["name", "display_name", "ref", "code", "default_code", "login"],
    words: &["name", "ref", "reference", "code", "number", "login", "title", "sku"],
};

pub(crate) const TEMPORAL: Vocabulary = Vocabulary {
    exact: &["date", "date_order", "invoice_date", "date_deadline"],
    words: &["date", "deadline", "due", "time", "day"],
};

pub(crate) const FINANCIAL: Vocabulary = Vocabulary {
    exact: &["amount_total", "price_total", "amount", "list_price", "price_unit"],
    words: &[
        "amount", "total", "price", "cost", "balance", "residual", "subtotal", "untaxed",
        "revenue", "tax", "fee", "budget", "salary", "credit", "debit", "due",
    ],
};

pub(crate) const STATUS: Vocabulary = Vocabulary {
    exact: &["state", "status", "payment_state", "stage", "active"],
    words: &["state", "status", "stage", "payment", "active", "paid", "done"],
};

pub(crate) const CONTACT: Vocabulary = Vocabulary {
    exact: &["email", "phone", "mobile", "website"],
    words: &[
        "email", "mail", "phone", "mobile", "street", "city", "zip", "address", "website",
        "fax", "contact",
    ],
};

/// Boolean names that describe a state rather than an attribute.
pub(crate) const STATE_FLAGS: &[&str] = &[
    "active", "paid", "done", "closed", "approved", "locked", "archived", "valid", "cancelled",
    "posted", "blocked",
];

const AUDIT_FIELDS: &[&str] = &[
    "create_date",
    "write_date",
    "create_uid",
    "write_uid",
    "__last_update",
];

/// Check if a field is record-keeping metadata rather than business data.
pub fn is_audit_field(name: &str) -> bool {
    AUDIT_FIELDS.contains(&name)
}

/// Lowercase words of a field name and optional label.
///
/// `invoice_date_due` with label "Due Date" yields
/// `["invoice", "date", "due", "due", "date"]`; duplicates are kept so label
/// words reinforce the name.
pub fn name_tokens(name: &str, label: Option<&str>) -> Vec<String> {
    name.split(['_', '.'])
        .chain(label.into_iter().flat_map(|l| l.split(|c: char| !c.is_alphanumeric())))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
