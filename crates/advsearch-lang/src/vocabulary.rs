//! Keyword tables of the question grammar.

/// Words carrying no meaning for search.
const STOPWORDS: &[&str] = &[
    "a", "all", "an", "any", "are", "be", "been", "can", "called", "display", "do", "does",
    "every", "find", "get", "give", "has", "have", "i", "is", "list", "me", "my", "named", "of",
    "or", "our", "please", "record", "records", "see", "show", "some", "that", "the", "their",
    "there", "to", "want", "was", "were", "what", "where", "which", "who", "whose", "with", "you",
];

/// Prepositions introducing a related record (`for customer X`).
pub const RELATION_ANCHORS: &[&str] = &["for", "from", "by"];

/// Words requesting related details (`with vendor details`).
pub const DETAIL_WORDS: &[&str] = &["details", "detail", "info", "information", "data"];

/// Words introducing a row limit (`top 5`).
pub const LIMIT_WORDS: &[&str] = &["top", "first", "limit"];

/// Comparison direction of a numeric or date bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    /// Check if this comparison sets a lower bound.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, Comparison::Gt | Comparison::Ge)
    }
}

const SINGLE_WORD_CUES: &[(&str, Comparison)] = &[
    ("over", Comparison::Gt),
    ("above", Comparison::Gt),
    ("exceeding", Comparison::Gt),
    ("under", Comparison::Lt),
    ("below", Comparison::Lt),
    ("minimum", Comparison::Ge),
    ("maximum", Comparison::Le),
];

const TWO_WORD_CUES: &[(&str, &str, Comparison)] = &[
    ("more", "than", Comparison::Gt),
    ("greater", "than", Comparison::Gt),
    ("higher", "than", Comparison::Gt),
    ("larger", "than", Comparison::Gt),
    ("less", "than", Comparison::Lt),
    ("lower", "than", Comparison::Lt),
    ("smaller", "than", Comparison::Lt),
    ("at", "least", Comparison::Ge),
    ("at", "most", Comparison::Le),
];

/// Comparison cue starting with `first`, and how many words it spans.
pub fn comparison_cue(first: &str, second: Option<&str>) -> Option<(Comparison, usize)> {
    if let Some(second) = second {
        if let Some((_, _, cmp)) = TWO_WORD_CUES
            .iter()
            .find(|(a, b, _)| *a == first && *b == second)
        {
            return Some((*cmp, 2));
        }
    }
    SINGLE_WORD_CUES
        .iter()
        .find(|(word, _)| *word == first)
        .map(|(_, cmp)| (*cmp, 1))
}

/// A status keyword and the selection values or flags it can denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusKeyword {
    pub word: &'static str,
    pub forms: &'static [&'static str],
    pub negated: bool,
}

const fn status(word: &'static str, forms: &'static [&'static str], negated: bool) -> StatusKeyword {
    StatusKeyword { word, forms, negated }
}

const STATUS_KEYWORDS: &[StatusKeyword] = &[
    status("unpaid", &["paid"], true),
    status("paid", &["paid"], false),
    status("draft", &["draft"], false),
    status("posted", &["posted"], false),
    status("cancelled", &["cancel", "cancelled", "canceled"], false),
    status("canceled", &["cancel", "cancelled", "canceled"], false),
    status("open", &["open", "posted"], false),
    status("done", &["done"], false),
    status("confirmed", &["confirmed", "sale"], false),
    status("sent", &["sent"], false),
    status("partial", &["partial"], false),
    status("locked", &["locked", "done"], false),
    status("active", &["active"], false),
    status("inactive", &["active"], true),
    status("archived", &["active"], true),
];

/// Look up a status keyword, folding plurals (`drafts`).
pub fn status_keyword(word: &str) -> Option<StatusKeyword> {
    let folded = fold_plural(word);
    STATUS_KEYWORDS
        .iter()
        .find(|k| k.word == word || k.word == folded)
        .copied()
}

/// Sort intent of an ordering keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKeyword {
    Newest,
    Oldest,
    Largest,
    Smallest,
}

/// Look up an ordering keyword.
pub fn order_keyword(word: &str) -> Option<OrderKeyword> {
    match word {
        "latest" | "newest" | "recent" | "last" => Some(OrderKeyword::Newest),
        "oldest" | "earliest" => Some(OrderKeyword::Oldest),
        "largest" | "biggest" | "highest" | "expensive" => Some(OrderKeyword::Largest),
        "smallest" | "lowest" | "cheapest" => Some(OrderKeyword::Smallest),
        _ => None,
    }
}

/// Check if a lowercase word is a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Check if a lowercase word belongs to the question grammar itself.
pub fn is_keyword(word: &str) -> bool {
    RELATION_ANCHORS.contains(&word)
        || DETAIL_WORDS.contains(&word)
        || LIMIT_WORDS.contains(&word)
        || status_keyword(word).is_some()
        || order_keyword(word).is_some()
        || comparison_cue(word, None).is_some()
}

/// Fold simple English plurals: `orders` → `order`, `companies` → `company`.
pub fn fold_plural(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") {
        return word.to_string();
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_plural() {
        assert_eq!(fold_plural("orders"), "order");
        assert_eq!(fold_plural("sales"), "sale");
        assert_eq!(fold_plural("companies"), "company");
        assert_eq!(fold_plural("addresses"), "address");
        assert_eq!(fold_plural("boxes"), "box");
        assert_eq!(fold_plural("status"), "status");
        assert_eq!(fold_plural("bus"), "bus");
        assert_eq!(fold_plural("bill"), "bill");
    }

    #[test]
    fn test_comparison_cues() {
        assert_eq!(comparison_cue("more", Some("than")), Some((Comparison::Gt, 2)));
        assert_eq!(comparison_cue("at", Some("most")), Some((Comparison::Le, 2)));
        assert_eq!(comparison_cue("over", Some("500")), Some((Comparison::Gt, 1)));
        assert_eq!(comparison_cue("at", Some("home")), None);
        assert!(Comparison::Ge.is_lower_bound());
    }

    #[test]
    fn test_status_keywords() {
        let unpaid = status_keyword("unpaid").unwrap();
        assert!(unpaid.negated);
        assert_eq!(unpaid.forms, &["paid"]);
        assert_eq!(status_keyword("drafts").map(|k| k.word), Some("draft"));
        assert!(status_keyword("bill").is_none());
    }

    #[test]
    fn test_keywords_are_not_stopwords() {
        for word in ["for", "from", "by", "details", "top", "unpaid", "over", "latest"] {
            assert!(is_keyword(word), "{}", word);
            assert!(!is_stopword(word), "{}", word);
        }
        assert!(is_stopword("the"));
    }
}
