//! Token normalization.
//!
//! Words are lowercased and stopwords and punctuation dropped. Quoted strings
//! and runs of capitalized words (proper nouns such as `Example Corp`) are
//! kept as value candidates with their original casing.

use chrono::NaiveDate;

use crate::lexer::{tokenize, Token};
use crate::span::Span;
use crate::vocabulary::{is_stopword, Comparison};

/// A normalized question fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Lowercase word.
    Word(String),
    /// Number.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Quoted string or proper-noun run, original casing.
    Value { text: String, quoted: bool },
    /// Comparison symbol.
    Compare(Comparison),
}

impl Term {
    /// The word, if this term is one.
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Term::Word(w) => Some(w),
            _ => None,
        }
    }
}

/// A term with the span of question text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub term: Term,
    pub span: Span,
}

impl Fragment {
    fn new(term: Term, span: Span) -> Self {
        Self { term, span }
    }
}

/// Normalize a question into fragments.
pub fn normalize(text: &str) -> Vec<Fragment> {
    let tokens = tokenize(text);
    let mut fragments = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let span = tokens[i].span;
        match &tokens[i].token {
            Token::Word(word) if i > 0 && is_proper(word) => {
                let mut run = vec![word.as_str()];
                let mut end = span;
                let mut j = i + 1;
                while let Some(Token::Word(next)) = tokens.get(j).map(|t| &t.token) {
                    if !is_proper(next) {
                        break;
                    }
                    run.push(next);
                    end = tokens[j].span;
                    j += 1;
                }
                fragments.push(Fragment::new(
                    Term::Value {
                        text: run.join(" "),
                        quoted: false,
                    },
                    span.merge(end),
                ));
                i = j;
                continue;
            }
            Token::Word(word) => {
                let lower = word.to_lowercase();
                if !is_stopword(&lower) {
                    fragments.push(Fragment::new(Term::Word(lower), span));
                }
            }
            Token::Number(n) => fragments.push(Fragment::new(Term::Number(*n), span)),
            Token::Date(d) => fragments.push(Fragment::new(Term::Date(*d), span)),
            Token::Quoted(text) | Token::QuotedSingle(text) if !text.is_empty() => {
                fragments.push(Fragment::new(
                    Term::Value {
                        text: text.clone(),
                        quoted: true,
                    },
                    span,
                ));
            }
            Token::Gt => fragments.push(Fragment::new(Term::Compare(Comparison::Gt), span)),
            Token::Ge => fragments.push(Fragment::new(Term::Compare(Comparison::Ge), span)),
            Token::Lt => fragments.push(Fragment::new(Term::Compare(Comparison::Lt), span)),
            Token::Le => fragments.push(Fragment::new(Term::Compare(Comparison::Le), span)),
            Token::Quoted(_) | Token::QuotedSingle(_) | Token::Eq | Token::Punct => {}
        }
        i += 1;
    }

    fragments
}

/// Turn unquoted proper-noun runs made only of `known` words back into words.
///
/// A capitalized `Bills` names a record type, not a value.
pub fn demote_known(fragments: Vec<Fragment>, known: impl Fn(&str) -> bool) -> Vec<Fragment> {
    let mut out = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        match &fragment.term {
            Term::Value { text, quoted: false }
                if text.split_whitespace().all(|w| known(&w.to_lowercase())) =>
            {
                out.extend(
                    text.split_whitespace()
                        .map(str::to_lowercase)
                        .filter(|w| !is_stopword(w))
                        .map(|w| Fragment::new(Term::Word(w), fragment.span)),
                );
            }
            _ => out.push(fragment),
        }
    }
    out
}

fn is_proper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase) && !is_stopword(&word.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn terms(text: &str) -> Vec<Term> {
        normalize(text).into_iter().map(|f| f.term).collect()
    }

    fn word(w: &str) -> Term {
        Term::Word(w.into())
    }

    fn value(text: &str, quoted: bool) -> Term {
        Term::Value {
            text: text.into(),
            quoted,
        }
    }

    #[test]
    fn test_stopwords_and_punctuation_dropped() {
        assert_eq!(
            terms("List all unpaid bills, with vendor details!"),
            vec![word("unpaid"), word("bills"), word("vendor"), word("details")]
        );
    }

    #[test]
    fn test_proper_noun_run() {
        assert_eq!(
            terms("List all sales orders for customer Example Corp"),
            vec![
                word("sales"),
                word("orders"),
                word("for"),
                word("customer"),
                value("Example Corp", false),
            ]
        );
    }

    #[test]
    fn test_first_word_is_not_a_proper_noun() {
        assert_eq!(terms("Bills over 500"), vec![word("bills"), word("over"), Term::Number(500.0)]);
    }

    #[test]
    fn test_quoted_values_keep_casing() {
        assert_eq!(
            terms(r#"contacts named "acme supplies" >= 3"#),
            vec![
                word("contacts"),
                value("acme supplies", true),
                Term::Compare(Comparison::Ge),
                Term::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_punctuation_breaks_runs() {
        assert_eq!(
            terms("bills from Acme, Globex"),
            vec![word("bills"), word("from"), value("Acme", false), value("Globex", false)]
        );
    }

    #[test]
    fn test_demote_known() {
        let fragments = normalize("show Unpaid Bills for Initech");
        let demoted: Vec<Term> = demote_known(fragments, |w| w == "unpaid" || w == "bills")
            .into_iter()
            .map(|f| f.term)
            .collect();
        assert_eq!(
            demoted,
            vec![word("unpaid"), word("bills"), word("for"), value("Initech", false)]
        );
    }
}
