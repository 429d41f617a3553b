//! Heuristic question parser.
//!
//! Parsing is a pure function of the question, a catalog snapshot and the
//! options: no backend is consulted. Fragments are matched left to right
//! against a fixed set of phrase rules; fragments no rule accepts are
//! dropped.

use std::collections::HashSet;
use std::iter;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, trace};

use advsearch_core::catalog::CatalogSnapshot;
use advsearch_core::classify::{name_tokens, FieldCategory, FieldClassifier};
use advsearch_core::config::{DEFAULT_MAX_HOPS, DEFAULT_PRIMARY_FIELDS, DEFAULT_RELATED_FIELDS};
use advsearch_core::relation::RelationshipHandler;
use advsearch_proto::{
    Condition, Diagnostic, FieldDescriptor, FieldPath, FieldType, FilterClause, JoinStep,
    ModelDescriptor, ModelSummary, OrderSpec, QueryIntent, RelatedQuery, SchemaLookup, Value,
};

use crate::dates::{self, DateRange, Unit};
use crate::error::ParseError;
use crate::normalize::{demote_known, normalize, Fragment, Term};
use crate::vocabulary::{
    comparison_cue, fold_plural, is_keyword, is_stopword, order_keyword, status_keyword,
    OrderKeyword, StatusKeyword, DETAIL_WORDS, LIMIT_WORDS, RELATION_ANCHORS,
};

/// Words of date phrases.
const DATE_WORDS: &[&str] = &[
    "today", "yesterday", "this", "current", "last", "past", "previous", "in", "during", "on",
    "since", "after", "before", "until", "between", "and", "not", "non",
];

/// Parser options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reference date for relative date phrases.
    pub today: NaiveDate,
    /// Row limit that overrides any limit in the question.
    pub limit: Option<u32>,
    /// Skip model selection and search this type.
    pub model_hint: Option<String>,
    /// Hop cap for relations named in the question.
    pub max_hops: usize,
}

impl ParseOptions {
    /// Create options with a reference date.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            limit: None,
            model_hint: None,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Override the row limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Force the target type.
    pub fn with_model_hint(mut self, model: impl Into<String>) -> Self {
        self.model_hint = Some(model.into());
        self
    }

    /// Set the relation hop cap.
    pub fn with_max_hops(mut self, hops: usize) -> Self {
        self.max_hops = hops;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// The structured reading of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Intent against the primary type.
    pub primary: QueryIntent,
    /// Related types whose details were requested.
    pub related: Vec<RelatedQuery>,
    /// Non-fatal observations made while parsing.
    pub notes: Vec<Diagnostic>,
}

impl ParsedQuery {
    /// Requested fields, related ones qualified by their relation path
    /// (`partner_id.name`).
    pub fn requested_fields(&self) -> Vec<String> {
        let related = self.related.iter().flat_map(|query| {
            let path = query.relation_path();
            query
                .intent
                .fields
                .iter()
                .map(move |field| format!("{}.{}", path, field))
        });
        self.primary.fields.iter().cloned().chain(related).collect()
    }
}

/// Pick the record type a question is about.
///
/// Types are scored by how many question words appear in their name parts,
/// label and synonyms. Words naming a related record (`customer` in
/// `for customer Acme`) and values do not count. A `hint` bypasses scoring.
pub fn select_model(
    text: &str,
    summaries: &[ModelSummary],
    hint: Option<&str>,
) -> Result<String, ParseError> {
    if let Some(hint) = hint {
        return hinted_model(summaries, hint);
    }
    let fragments = prepare(text, summaries)?;
    score_models(text, &fragments, summaries)
}

/// Parse a question against a catalog snapshot.
pub fn parse(
    text: &str,
    snapshot: &CatalogSnapshot,
    options: &ParseOptions,
) -> Result<ParsedQuery, ParseError> {
    let fragments = prepare(text, snapshot.summaries())?;
    let primary = match options.model_hint.as_deref() {
        Some(hint) => hinted_model(snapshot.summaries(), hint)?,
        None => score_models(text, &fragments, snapshot.summaries())?,
    };
    let model = snapshot
        .model(&primary)
        .ok_or(ParseError::UnknownModel { model: primary })?;

    let mut interpreter = Interpreter::new(text, &fragments, snapshot, model, options);
    interpreter.run();
    Ok(interpreter.finish())
}

fn hinted_model(summaries: &[ModelSummary], hint: &str) -> Result<String, ParseError> {
    summaries
        .iter()
        .find(|s| s.name == hint)
        .map(|s| s.name.clone())
        .ok_or_else(|| ParseError::UnknownModel {
            model: hint.to_string(),
        })
}

/// Normalize a question, keeping capitalized type names and keywords as words.
fn prepare(text: &str, summaries: &[ModelSummary]) -> Result<Vec<Fragment>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyQuery);
    }

    let known: HashSet<String> = summaries
        .iter()
        .flat_map(ModelSummary::vocabulary)
        .map(|w| fold_plural(&w))
        .collect();
    let fragments = demote_known(normalize(text), |word| {
        is_stopword(word)
            || is_keyword(word)
            || DATE_WORDS.contains(&word)
            || dates::month_number(word).is_some()
            || Unit::parse(word).is_some()
            || known.contains(&fold_plural(word))
    });

    if fragments.is_empty() {
        return Err(ParseError::EmptyQuery);
    }
    Ok(fragments)
}

/// Position of the value an anchor introduces: `for [hint words] Value`,
/// with at most two hint words.
fn anchored_value(fragments: &[Fragment], anchor: usize) -> Option<usize> {
    for offset in 1..=3 {
        match &fragments.get(anchor + offset)?.term {
            Term::Value { .. } => return Some(anchor + offset),
            Term::Word(_) if offset < 3 => continue,
            _ => return None,
        }
    }
    None
}

/// Positions that do not describe the primary type: values and the words
/// naming related records.
fn related_positions(fragments: &[Fragment]) -> HashSet<usize> {
    let mut positions = HashSet::new();
    for (i, fragment) in fragments.iter().enumerate() {
        match &fragment.term {
            Term::Value { .. } => {
                positions.insert(i);
            }
            Term::Word(w) if DETAIL_WORDS.contains(&w.as_str()) => {
                if i > 0 && fragments[i - 1].term.as_word().is_some() {
                    positions.insert(i - 1);
                }
            }
            Term::Word(w) if RELATION_ANCHORS.contains(&w.as_str()) => {
                if let Some(value) = anchored_value(fragments, i) {
                    positions.extend(i + 1..value);
                }
            }
            _ => {}
        }
    }
    positions
}

fn score_models(
    text: &str,
    fragments: &[Fragment],
    summaries: &[ModelSummary],
) -> Result<String, ParseError> {
    let skipped = related_positions(fragments);
    let mut words: Vec<String> = fragments
        .iter()
        .enumerate()
        .filter(|(i, _)| !skipped.contains(i))
        .filter_map(|(_, f)| f.term.as_word())
        .filter(|w| !is_keyword(w))
        .map(fold_plural)
        .collect();
    words.sort();
    words.dedup();

    let scores: Vec<(usize, &ModelSummary)> = summaries
        .iter()
        .map(|summary| {
            let vocabulary: HashSet<String> =
                summary.vocabulary().iter().map(|w| fold_plural(w)).collect();
            let score = words.iter().filter(|w| vocabulary.contains(*w)).count();
            trace!(model = %summary.name, score, "model score");
            (score, summary)
        })
        .collect();

    let top = scores.iter().map(|(score, _)| *score).max().unwrap_or(0);
    if top == 0 {
        return Err(ParseError::NoMatchingModel {
            query: text.trim().to_string(),
        });
    }

    let leaders: Vec<String> = scores
        .iter()
        .filter(|(score, _)| *score == top)
        .map(|(_, s)| s.name.clone())
        .collect();
    match leaders.as_slice() {
        [model] => {
            debug!(model = %model, score = top, "model selected");
            Ok(model.clone())
        }
        _ => Err(ParseError::AmbiguousModel {
            candidates: leaders,
        }),
    }
}

/// A positive whole number small enough to count rows or periods.
fn whole_count(n: f64) -> Option<u32> {
    (n >= 1.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

fn is_year(n: f64) -> bool {
    n.fract() == 0.0 && (1900.0..=2100.0).contains(&n)
}

fn normalize_choice(s: &str) -> String {
    s.trim().to_lowercase().replace('_', " ")
}

fn is_negation_of(choice: &str, form: &str) -> bool {
    choice == format!("not {}", form) || choice == format!("un{}", form) || choice == format!("no {}", form)
}

/// How a date operand bounds a range.
#[derive(Debug, Clone, Copy)]
enum DateBound {
    Within,
    Since,
    After,
    Before,
    Until,
}

/// Applies phrase rules to fragments and accumulates the intent.
struct Interpreter<'a> {
    text: &'a str,
    fragments: &'a [Fragment],
    snapshot: &'a CatalogSnapshot,
    model: &'a ModelDescriptor,
    options: &'a ParseOptions,
    relations: RelationshipHandler,
    vocabulary: Vec<String>,
    intent: QueryIntent,
    related: Vec<RelatedQuery>,
    relation_fields: Vec<String>,
    notes: Vec<Diagnostic>,
    limit: Option<u32>,
}

impl<'a> Interpreter<'a> {
    fn new(
        text: &'a str,
        fragments: &'a [Fragment],
        snapshot: &'a CatalogSnapshot,
        model: &'a ModelDescriptor,
        options: &'a ParseOptions,
    ) -> Self {
        let mut vocabulary: Vec<String> = fragments
            .iter()
            .filter_map(|f| f.term.as_word())
            .flat_map(|w| [w.to_string(), fold_plural(w)])
            .collect();
        vocabulary.sort();
        vocabulary.dedup();

        Self {
            text,
            fragments,
            snapshot,
            model,
            options,
            relations: RelationshipHandler::new(options.max_hops),
            vocabulary,
            intent: QueryIntent::new(model.name.clone()),
            related: Vec::new(),
            relation_fields: Vec::new(),
            notes: Vec::new(),
            limit: None,
        }
    }

    fn run(&mut self) {
        let mut i = 0;
        while i < self.fragments.len() {
            let consumed = self
                .limit_at(i)
                .or_else(|| self.between_at(i))
                .or_else(|| self.comparison_at(i))
                .or_else(|| self.date_at(i))
                .or_else(|| self.status_at(i))
                .or_else(|| self.relation_filter_at(i))
                .or_else(|| self.details_at(i))
                .or_else(|| self.order_at(i))
                .or_else(|| self.value_at(i));

            match consumed {
                Some(n) => i += n.max(1),
                None => {
                    trace!(fragment = self.fragments[i].span.slice(self.text), "fragment dropped");
                    i += 1;
                }
            }
        }
    }

    fn finish(mut self) -> ParsedQuery {
        let mut fields = FieldClassifier::default_fields(self.model, DEFAULT_PRIMARY_FIELDS);

        // Filtering through a relation shows the relation column.
        let filtered = self
            .intent
            .filters
            .iter()
            .filter_map(|f| f.path.head())
            .filter(|name| self.model.field(name).is_some());
        let ordered = self.intent.order.iter().map(|o| o.field.as_str());
        let mentioned: Vec<String> = filtered
            .chain(ordered)
            .chain(self.relation_fields.iter().map(String::as_str))
            .map(String::from)
            .collect();
        for field in mentioned {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        self.intent.fields = fields;
        self.intent.limit = self.options.limit.or(self.limit);

        debug!(
            model = %self.model.name,
            filters = self.intent.filters.len(),
            related = self.related.len(),
            limit = ?self.intent.limit,
            "question parsed"
        );

        ParsedQuery {
            primary: self.intent,
            related: self.related,
            notes: self.notes,
        }
    }

    fn word(&self, i: usize) -> Option<&'a str> {
        let fragments: &'a [Fragment] = self.fragments;
        fragments.get(i)?.term.as_word()
    }

    fn number(&self, i: usize) -> Option<f64> {
        match self.fragments.get(i)?.term {
            Term::Number(n) => Some(n),
            _ => None,
        }
    }

    fn date(&self, i: usize) -> Option<NaiveDate> {
        match self.fragments.get(i)?.term {
            Term::Date(d) => Some(d),
            _ => None,
        }
    }

    // ============== Phrase rules ==============

    /// `top 5`, `first 10`, `limit 20`
    fn limit_at(&mut self, i: usize) -> Option<usize> {
        if !LIMIT_WORDS.contains(&self.word(i)?) {
            return None;
        }
        self.limit = Some(whole_count(self.number(i + 1)?)?);
        Some(2)
    }

    /// `between 100 and 500`, `between 2026-01-01 and 2026-03-31`
    fn between_at(&mut self, i: usize) -> Option<usize> {
        if self.word(i)? != "between" || self.word(i + 2) != Some("and") {
            return None;
        }
        if let (Some(a), Some(b)) = (self.number(i + 1), self.number(i + 3)) {
            self.amount_range(Some(a.min(b)), Some(a.max(b)));
            return Some(4);
        }
        if let (Some(a), Some(b)) = (self.date(i + 1), self.date(i + 3)) {
            self.date_range(Some(a.min(b)), Some(a.max(b)));
            return Some(4);
        }
        None
    }

    /// `over 500`, `at least 100`, `< 20`
    fn comparison_at(&mut self, i: usize) -> Option<usize> {
        let (cmp, width) = match &self.fragments.get(i)?.term {
            Term::Compare(cmp) => (*cmp, 1),
            Term::Word(w) => comparison_cue(w, self.word(i + 1))?,
            _ => return None,
        };
        let n = self.number(i + width)?;
        if cmp.is_lower_bound() {
            self.amount_range(Some(n), None);
        } else {
            self.amount_range(None, Some(n));
        }
        Some(width + 1)
    }

    /// `today`, `last month`, `last 30 days`, `in 2025`, `since 2026-09-01`, ...
    fn date_at(&mut self, i: usize) -> Option<usize> {
        let today = self.options.today;
        let (range, width, bound) = match self.word(i)? {
            "today" => (dates::period(today, Unit::Day, 0)?, 1, DateBound::Within),
            "yesterday" => (dates::period(today, Unit::Day, 1)?, 1, DateBound::Within),
            "this" | "current" => {
                let unit = Unit::parse(self.word(i + 1)?)?;
                (dates::period(today, unit, 0)?, 2, DateBound::Within)
            }
            "last" | "past" | "previous" => match self.number(i + 1) {
                Some(n) => {
                    let count = whole_count(n)?;
                    let unit = Unit::parse(self.word(i + 2)?)?;
                    (dates::trailing(today, count, unit)?, 3, DateBound::Within)
                }
                None => {
                    let unit = Unit::parse(self.word(i + 1)?)?;
                    (dates::period(today, unit, 1)?, 2, DateBound::Within)
                }
            },
            word @ ("in" | "during" | "on" | "since" | "after" | "before" | "until") => {
                let (range, width) = self.date_operand(i + 1)?;
                let bound = match word {
                    "since" => DateBound::Since,
                    "after" => DateBound::After,
                    "before" => DateBound::Before,
                    "until" => DateBound::Until,
                    _ => DateBound::Within,
                };
                (range, width + 1, bound)
            }
            _ => return None,
        };

        let (first, last) = range;
        match bound {
            DateBound::Within => self.date_range(Some(first), Some(last)),
            DateBound::Since => self.date_range(Some(first), None),
            DateBound::After => self.date_range(last.succ_opt(), None),
            DateBound::Before => self.date_range(None, first.pred_opt()),
            DateBound::Until => self.date_range(None, Some(last)),
        }
        Some(width)
    }

    /// A date, a year, or a month name optionally followed by a year.
    fn date_operand(&self, i: usize) -> Option<(DateRange, usize)> {
        match &self.fragments.get(i)?.term {
            Term::Date(d) => Some(((*d, *d), 1)),
            Term::Number(n) if is_year(*n) => Some((dates::year_range(*n as i32)?, 1)),
            Term::Word(w) => {
                let month = dates::month_number(w)?;
                match self.number(i + 1).filter(|n| is_year(*n)) {
                    Some(year) => Some((dates::month_range(year as i32, month)?, 2)),
                    None => Some((dates::month_range(self.options.today.year(), month)?, 1)),
                }
            }
            _ => None,
        }
    }

    /// `unpaid`, `not paid`, `draft`, `cancelled`, `inactive`, ...
    fn status_at(&mut self, i: usize) -> Option<usize> {
        let word = self.word(i)?;
        let (keyword, negated, width) = if matches!(word, "not" | "non") {
            let keyword = status_keyword(self.word(i + 1)?)?;
            (keyword, !keyword.negated, 2)
        } else {
            let keyword = status_keyword(word)?;
            (keyword, keyword.negated, 1)
        };

        match self.status_filter(keyword, negated) {
            Some(clause) => self.add_filter(clause),
            None => debug!(keyword = keyword.word, model = %self.model.name, "no status field accepts keyword"),
        }
        Some(width)
    }

    /// `for customer Example Corp`, `from vendor "Acme"`, `by Initech`
    fn relation_filter_at(&mut self, i: usize) -> Option<usize> {
        if !RELATION_ANCHORS.contains(&self.word(i)?) {
            return None;
        }
        let fragments: &'a [Fragment] = self.fragments;
        let position = anchored_value(fragments, i)?;
        let Term::Value { text, .. } = &fragments[position].term else {
            return None;
        };

        let hints: Vec<String> = (i + 1..position)
            .filter_map(|j| self.word(j))
            .map(String::from)
            .collect();
        let steps = if hints.is_empty() {
            self.default_relation()
        } else {
            self.resolve_hint(&hints)
        };

        match steps.and_then(|steps| self.display_path(&steps)) {
            Some(path) => self.add_filter(FilterClause::ilike(path, text.clone())),
            None => debug!(hints = ?hints, model = %self.model.name, "no relation matches hint"),
        }
        Some(position - i + 1)
    }

    /// `vendor details`, `customer info`
    fn details_at(&mut self, i: usize) -> Option<usize> {
        let hint = self.word(i)?;
        if !DETAIL_WORDS.contains(&self.word(i + 1)?) || DETAIL_WORDS.contains(&hint) || is_keyword(hint) {
            return None;
        }

        match self.resolve_hint(&[hint.to_string()]) {
            Some(path) => self.add_related(path),
            None => debug!(hint, model = %self.model.name, "no relation for details"),
        }
        Some(2)
    }

    /// `latest`, `oldest`, `largest`, `cheapest`, ...
    fn order_at(&mut self, i: usize) -> Option<usize> {
        let keyword = order_keyword(self.word(i)?)?;
        let (category, descending) = match keyword {
            OrderKeyword::Newest => (FieldCategory::Temporal, true),
            OrderKeyword::Oldest => (FieldCategory::Temporal, false),
            OrderKeyword::Largest => (FieldCategory::Financial, true),
            OrderKeyword::Smallest => (FieldCategory::Financial, false),
        };

        match FieldClassifier::best_field(self.model, category) {
            Some(field) => {
                let spec = if descending {
                    OrderSpec::desc(field.name.clone())
                } else {
                    OrderSpec::asc(field.name.clone())
                };
                self.intent.order = vec![spec];
            }
            None => debug!(category = %category, model = %self.model.name, "no field to order by"),
        }
        Some(1)
    }

    /// An unanchored quoted string or proper noun names a primary record.
    fn value_at(&mut self, i: usize) -> Option<usize> {
        let fragments: &'a [Fragment] = self.fragments;
        let Term::Value { text, .. } = &fragments.get(i)?.term else {
            return None;
        };

        match FieldClassifier::display_field(self.model) {
            Some(display) => self.add_filter(FilterClause::ilike(
                FieldPath::field(display.name.clone()),
                text.clone(),
            )),
            None => debug!(model = %self.model.name, "no display field for value"),
        }
        Some(1)
    }

    // ============== Field and relation resolution ==============

    fn amount_range(&mut self, min: Option<f64>, max: Option<f64>) {
        let Some(field) = FieldClassifier::best_field(self.model, FieldCategory::Financial) else {
            debug!(model = %self.model.name, "no amount field for comparison");
            return;
        };
        let value = |n: f64| match field.field_type {
            FieldType::Integer if n.fract() == 0.0 => Value::Int(n as i64),
            _ => Value::Float(n),
        };
        self.add_filter(FilterClause::range(field.name.clone(), min.map(value), max.map(value)));
    }

    fn date_range(&mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) {
        let Some(field) = FieldClassifier::best_field(self.model, FieldCategory::Temporal) else {
            debug!(model = %self.model.name, "no date field for date phrase");
            return;
        };
        self.add_filter(FilterClause::range(
            field.name.clone(),
            min.map(Value::Date),
            max.map(Value::Date),
        ));
    }

    fn status_filter(&self, keyword: StatusKeyword, negated: bool) -> Option<FilterClause> {
        let fields = FieldClassifier::fields_in(self.model, FieldCategory::Status);

        // A dedicated negative choice ("Not Paid") beats a `!=` filter.
        if negated {
            for field in &fields {
                let negative = field.selection.iter().find(|choice| {
                    keyword.forms.iter().any(|form| {
                        is_negation_of(&normalize_choice(choice.value()), form)
                            || is_negation_of(&normalize_choice(choice.label()), form)
                    })
                });
                if let Some(choice) = negative {
                    return Some(FilterClause::equals(field.name.clone(), choice.value()));
                }
            }
        }

        for field in &fields {
            if field.field_type == FieldType::Boolean {
                if keyword.forms.contains(&field.name.as_str()) {
                    return Some(FilterClause::equals(field.name.clone(), !negated));
                }
                continue;
            }

            let choice = field.selection.iter().find(|choice| {
                let value = normalize_choice(choice.value());
                let label = normalize_choice(choice.label());
                keyword.forms.iter().any(|form| value == *form || label == *form)
            });
            if let Some(choice) = choice {
                let value = Value::from(choice.value());
                return Some(if negated {
                    FilterClause::new(FieldPath::field(field.name.clone()), Condition::NotEquals(value))
                } else {
                    FilterClause::equals(field.name.clone(), value)
                });
            }
        }
        None
    }

    /// The relation a bare `by X` refers to: the first required single
    /// reference, else the first single reference.
    fn default_relation(&self) -> Option<Vec<JoinStep>> {
        let candidates: Vec<&FieldDescriptor> = self
            .model
            .iter_fields()
            .filter(|f| f.field_type == FieldType::SingleReference)
            .filter(|f| f.target().is_some_and(|t| self.snapshot.contains(t)))
            .collect();
        let field = candidates
            .iter()
            .find(|f| f.required)
            .or_else(|| candidates.first())?;
        JoinStep::from_field(&self.model.name, field).ok().map(|step| vec![step])
    }

    /// Join path to the record type named by `hints`.
    ///
    /// A relational field whose name or label mentions a hint wins; otherwise
    /// a type whose vocabulary mentions a hint is reached through the
    /// relationship handler.
    fn resolve_hint(&self, hints: &[String]) -> Option<Vec<JoinStep>> {
        let folded: Vec<String> = hints.iter().map(|h| fold_plural(h)).collect();
        let mentions = |tokens: &[String]| tokens.iter().any(|t| folded.contains(&fold_plural(t)));

        let direct = self.model.relational_fields().find(|f| {
            f.target().is_some_and(|t| self.snapshot.contains(t))
                && mentions(name_tokens(&f.name, f.label.as_deref()).as_slice())
        });
        if let Some(field) = direct {
            return JoinStep::from_field(&self.model.name, field).ok().map(|step| vec![step]);
        }

        for summary in self.snapshot.summaries() {
            if summary.name == self.model.name
                || !self.snapshot.contains(&summary.name)
                || !mentions(summary.vocabulary().as_slice())
            {
                continue;
            }
            match self
                .relations
                .resolve(self.snapshot, &self.model.name, &summary.name, &self.vocabulary)
            {
                Ok(path) if !path.is_empty() => return Some(path),
                Ok(_) => {}
                Err(e) => debug!(error = %e, "hinted relation unresolved"),
            }
        }
        None
    }

    /// `relation.path.display_field` for a join path.
    fn display_path(&self, steps: &[JoinStep]) -> Option<FieldPath> {
        let target = self.snapshot.model(&steps.last()?.target)?;
        let display = FieldClassifier::display_field(target)?;
        Some(FieldPath::from_segments(
            steps
                .iter()
                .map(|s| s.field.clone())
                .chain(iter::once(display.name.clone())),
        ))
    }

    fn add_related(&mut self, path: Vec<JoinStep>) {
        let Some(last) = path.last() else {
            return;
        };
        if self.related.iter().any(|q| q.path == path) {
            return;
        }

        let target = last.target.clone();
        let fields = self
            .snapshot
            .model(&target)
            .map(|m| FieldClassifier::default_fields(m, DEFAULT_RELATED_FIELDS))
            .unwrap_or_default();
        if !self.relation_fields.contains(&path[0].field) {
            self.relation_fields.push(path[0].field.clone());
        }
        debug!(model = %target, hops = path.len(), "related details requested");
        self.related
            .push(RelatedQuery::new(path, QueryIntent::new(target).with_fields(fields)));
    }

    /// Add a filter. Complementary range bounds on one field merge; any other
    /// filter on an already filtered field replaces the earlier one.
    fn add_filter(&mut self, clause: FilterClause) {
        if let (Some(existing), Condition::Range { min, max }) =
            (self.intent.filter_on(&clause.path), &clause.condition)
        {
            if let Condition::Range {
                min: old_min,
                max: old_max,
            } = &existing.condition
            {
                if (old_min.is_none() || min.is_none()) && (old_max.is_none() || max.is_none()) {
                    let merged = FilterClause::new(
                        clause.path.clone(),
                        Condition::Range {
                            min: min.clone().or_else(|| old_min.clone()),
                            max: max.clone().or_else(|| old_max.clone()),
                        },
                    );
                    self.intent.upsert_filter(merged);
                    return;
                }
            }
        }

        if let Some(previous) = self.intent.upsert_filter(clause.clone()) {
            debug!(
                model = %self.model.name,
                field = %clause.path,
                previous = %previous,
                current = %clause,
                "filter overridden"
            );
            self.notes.push(Diagnostic::FilterOverridden {
                model: self.model.name.clone(),
                field: clause.path.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advsearch_proto::{Cardinality, SortDirection};
    use pretty_assertions::assert_eq;

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_models(
            vec![
                ModelSummary::new("account.move")
                    .with_label("Bill")
                    .with_synonyms(&["invoice"]),
                ModelSummary::new("res.partner")
                    .with_label("Contact")
                    .with_synonyms(&["vendor", "customer", "supplier"]),
                ModelSummary::new("sale.order").with_label("Sales Order"),
            ],
            vec![
                ModelDescriptor::from_fields(
                    "account.move",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text),
                        FieldDescriptor::reference("partner_id", FieldType::SingleReference, "res.partner")
                            .with_label("Vendor"),
                        FieldDescriptor::new("invoice_date", FieldType::Date),
                        FieldDescriptor::new("amount_total", FieldType::Float),
                        FieldDescriptor::selection("state", &[("draft", "Draft"), ("posted", "Posted")])
                            .required(),
                        FieldDescriptor::selection(
                            "payment_state",
                            &[("not_paid", "Not Paid"), ("paid", "Paid")],
                        ),
                    ],
                ),
                ModelDescriptor::from_fields(
                    "res.partner",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text),
                        FieldDescriptor::new("email", FieldType::Text),
                        FieldDescriptor::new("active", FieldType::Boolean),
                    ],
                ),
                ModelDescriptor::from_fields(
                    "sale.order",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text).required(),
                        FieldDescriptor::reference("partner_id", FieldType::SingleReference, "res.partner")
                            .with_label("Customer")
                            .required(),
                        FieldDescriptor::new("date_order", FieldType::DateTime).required(),
                        FieldDescriptor::new("amount_total", FieldType::Float),
                        FieldDescriptor::selection("state", &[("draft", "Quotation"), ("sale", "Sales Order")]),
                    ],
                ),
            ],
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn options() -> ParseOptions {
        ParseOptions::new(date(2026, 10, 16))
    }

    fn run(text: &str) -> ParsedQuery {
        parse(text, &snapshot(), &options()).unwrap()
    }

    fn filter(parsed: &ParsedQuery, path: &str) -> Condition {
        parsed
            .primary
            .filter_on(&FieldPath::parse(path))
            .map(|f| f.condition.clone())
            .unwrap_or_else(|| panic!("no filter on {}", path))
    }

    #[test]
    fn test_unpaid_bills_with_vendor_details() {
        let parsed = run("List all unpaid bills with vendor details");

        assert_eq!(parsed.primary.model, "account.move");
        assert_eq!(
            filter(&parsed, "payment_state"),
            Condition::Equals(Value::from("not_paid"))
        );
        assert_eq!(parsed.related.len(), 1);
        assert_eq!(parsed.related[0].path[0].field, "partner_id");
        assert_eq!(parsed.related[0].path[0].cardinality, Cardinality::OneToOne);
        assert!(parsed.requested_fields().contains(&"partner_id.name".to_string()));
        assert!(parsed.primary.fields.contains(&"partner_id".to_string()));
    }

    #[test]
    fn test_sales_orders_for_customer() {
        let parsed = run("List all sales orders for customer Example Corp");

        assert_eq!(parsed.primary.model, "sale.order");
        assert_eq!(parsed.primary.filters.len(), 1);
        assert_eq!(parsed.primary.filters[0].path.to_string(), "partner_id.name");
        assert_eq!(
            parsed.primary.filters[0].condition,
            Condition::Ilike("Example Corp".into())
        );
        assert!(parsed.related.is_empty());
    }

    #[test]
    fn test_model_hint_bypasses_scoring() {
        let parsed = parse("anything named Acme", &snapshot(), &options().with_model_hint("res.partner"))
            .unwrap();
        assert_eq!(parsed.primary.model, "res.partner");
        assert_eq!(filter(&parsed, "name"), Condition::Ilike("Acme".into()));

        let err = parse("bills", &snapshot(), &options().with_model_hint("stock.picking")).unwrap_err();
        assert_eq!(err, ParseError::UnknownModel { model: "stock.picking".into() });
    }

    #[test]
    fn test_model_selection_failures() {
        let summaries = snapshot().summaries().to_vec();

        assert_eq!(select_model("   ", &summaries, None), Err(ParseError::EmptyQuery));
        assert!(matches!(
            select_model("weather forecast", &summaries, None),
            Err(ParseError::NoMatchingModel { .. })
        ));
        assert_eq!(
            select_model("bills and orders", &summaries, None),
            Err(ParseError::AmbiguousModel {
                candidates: vec!["account.move".into(), "sale.order".into()],
            })
        );
        assert_eq!(select_model("Invoices", &summaries, None), Ok("account.move".into()));
    }

    #[test]
    fn test_amount_comparisons() {
        let parsed = run("bills over 1,000");
        assert_eq!(
            filter(&parsed, "amount_total"),
            Condition::Range { min: Some(Value::Float(1000.0)), max: None }
        );

        let parsed = run("bills more than 100 and less than 500");
        assert_eq!(
            filter(&parsed, "amount_total"),
            Condition::Range {
                min: Some(Value::Float(100.0)),
                max: Some(Value::Float(500.0)),
            }
        );
        assert!(parsed.notes.is_empty());

        let parsed = run("bills between 500 and 100");
        assert_eq!(
            filter(&parsed, "amount_total"),
            Condition::Range {
                min: Some(Value::Float(100.0)),
                max: Some(Value::Float(500.0)),
            }
        );
    }

    #[test]
    fn test_date_phrases() {
        let parsed = run("bills from last month");
        assert_eq!(
            filter(&parsed, "invoice_date"),
            Condition::Range {
                min: Some(Value::Date(date(2026, 9, 1))),
                max: Some(Value::Date(date(2026, 9, 30))),
            }
        );

        let parsed = run("bills in September 2025");
        assert_eq!(
            filter(&parsed, "invoice_date"),
            Condition::Range {
                min: Some(Value::Date(date(2025, 9, 1))),
                max: Some(Value::Date(date(2025, 9, 30))),
            }
        );

        let parsed = run("bills since 2026-10-01");
        assert_eq!(
            filter(&parsed, "invoice_date"),
            Condition::Range { min: Some(Value::Date(date(2026, 10, 1))), max: None }
        );

        let parsed = run("bills before 2026");
        assert_eq!(
            filter(&parsed, "invoice_date"),
            Condition::Range { min: None, max: Some(Value::Date(date(2025, 12, 31))) }
        );

        let parsed = run("sales orders in the last 7 days");
        assert_eq!(
            filter(&parsed, "date_order"),
            Condition::Range {
                min: Some(Value::Date(date(2026, 10, 9))),
                max: Some(Value::Date(date(2026, 10, 16))),
            }
        );
    }

    #[test]
    fn test_oversized_counts_are_dropped() {
        let parsed = run("bills in the last 400000000 years");
        assert_eq!(parsed.primary.model, "account.move");
        assert!(parsed.primary.filter_on(&FieldPath::parse("invoice_date")).is_none());

        let parsed = run("top 99999999999 bills");
        assert_eq!(parsed.primary.limit, None);

        let parsed = run("first 4294967295 bills");
        assert_eq!(parsed.primary.limit, Some(u32::MAX));
    }

    #[test]
    fn test_status_keywords() {
        assert_eq!(filter(&run("draft bills"), "state"), Condition::Equals(Value::from("draft")));
        assert_eq!(
            filter(&run("bills not paid"), "payment_state"),
            Condition::Equals(Value::from("not_paid"))
        );
        assert_eq!(
            filter(&run("bills that are not draft"), "state"),
            Condition::NotEquals(Value::from("draft"))
        );
        assert_eq!(
            filter(&run("inactive contacts"), "active"),
            Condition::Equals(Value::Bool(false))
        );
    }

    #[test]
    fn test_conflicting_filters_override() {
        let parsed = run("paid bills that are unpaid");

        assert_eq!(
            filter(&parsed, "payment_state"),
            Condition::Equals(Value::from("not_paid"))
        );
        assert_eq!(
            parsed.notes,
            vec![Diagnostic::FilterOverridden {
                model: "account.move".into(),
                field: "payment_state".into(),
            }]
        );
    }

    #[test]
    fn test_limit_and_ordering() {
        let parsed = run("top 5 largest bills");
        assert_eq!(parsed.primary.limit, Some(5));
        assert_eq!(parsed.primary.order[0].field, "amount_total");
        assert_eq!(parsed.primary.order[0].direction, SortDirection::Desc);

        let parsed = run("latest sales orders");
        assert_eq!(parsed.primary.order[0].field, "date_order");
        assert_eq!(parsed.primary.limit, None);

        let parsed = parse("top 5 bills", &snapshot(), &options().with_limit(2)).unwrap();
        assert_eq!(parsed.primary.limit, Some(2));
    }

    #[test]
    fn test_unanchored_value_matches_display_field() {
        let parsed = run(r#"bills "BILL/2026/0003""#);
        assert_eq!(filter(&parsed, "name"), Condition::Ilike("BILL/2026/0003".into()));
    }

    #[test]
    fn test_bare_by_uses_required_reference() {
        let parsed = run("sales orders by Initech");
        assert_eq!(
            filter(&parsed, "partner_id.name"),
            Condition::Ilike("Initech".into())
        );
    }

    #[test]
    fn test_unrecognized_fragments_are_dropped() {
        let parsed = run("bills, please, quickly!");
        assert_eq!(parsed.primary.model, "account.move");
        assert!(parsed.primary.filters.is_empty());
        assert!(parsed.related.is_empty());
    }

    #[test]
    fn test_filtered_fields_are_requested() {
        let parsed = run("bills over 10");
        let fields = parsed.requested_fields();
        assert_eq!(fields[0], "name");
        assert!(fields.contains(&"amount_total".to_string()));
    }
}
