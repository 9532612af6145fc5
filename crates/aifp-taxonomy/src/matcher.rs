// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::{Taxonomy, TaxonomyError};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// A single search term: a lowercase substring, or a `[regex]` pattern rule.
#[derive(Debug, Clone)]
pub enum SearchTerm {
    Literal(String),
    Pattern(Regex),
}

impl SearchTerm {
    pub fn parse(raw: &str) -> Result<Self, regex::Error> {
        let trimmed = raw.trim();
        if trimmed.len() > 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
            let inner = &trimmed[1..trimmed.len() - 1];
            Regex::new(&format!("(?i){}", inner)).map(SearchTerm::Pattern)
        } else {
            Ok(SearchTerm::Literal(trimmed.to_lowercase()))
        }
    }

    /// `title` must already be lowercase.
    pub fn is_match(&self, title: &str) -> bool {
        match self {
            SearchTerm::Literal(term) => title.contains(term.as_str()),
            SearchTerm::Pattern(re) => re.is_match(title),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SearchTerm::Literal(term) => term,
            SearchTerm::Pattern(re) => re.as_str().trim_start_matches("(?i)"),
        }
    }
}

/// Resolved metadata for one taxonomy type entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub code: String,
    pub manufacturer: String,
    pub name: Option<String>,
    pub series: Option<String>,
    pub wingspan: Option<f64>,
}

#[derive(Debug, Clone)]
struct Decision {
    gate: usize,
    term: SearchTerm,
    type_index: usize,
}

/// The taxonomy flattened into an ordered list of `(term, type)` decisions.
///
/// Decision `i` applies only when its manufacturer gate passes. The first
/// applicable decision whose term matches wins, so list order is the
/// tie-break.
#[derive(Debug, Clone)]
pub struct DecisionList {
    gates: Vec<Vec<SearchTerm>>,
    decisions: Vec<Decision>,
    types: Vec<TypeInfo>,
}

impl DecisionList {
    pub fn compile(taxonomy: &Taxonomy) -> Result<Self, TaxonomyError> {
        let mut gates = Vec::with_capacity(taxonomy.manufacturers.len());
        let mut decisions = Vec::new();
        let mut types = Vec::with_capacity(taxonomy.type_count());

        for mfr in &taxonomy.manufacturers {
            let gate = gates.len();
            let mut gate_terms = Vec::with_capacity(mfr.search.len());
            for raw in mfr.search.iter().filter(|s| !s.trim().is_empty()) {
                let term = SearchTerm::parse(raw).map_err(|source| TaxonomyError::InvalidPattern {
                    owner: mfr.name.clone(),
                    pattern: raw.clone(),
                    source,
                })?;
                gate_terms.push(term);
            }
            gates.push(gate_terms);

            for entry in &mfr.types {
                let type_index = types.len();
                types.push(TypeInfo {
                    code: entry.code.clone(),
                    manufacturer: mfr.name.clone(),
                    name: entry.name.clone(),
                    series: entry.series.clone(),
                    wingspan: entry.wingspan,
                });

                let rules = entry.search.iter().chain(entry.pattern.iter());
                for raw in rules.filter(|s| !s.trim().is_empty()) {
                    // A bare `pattern` field is a regex even without brackets.
                    let is_pattern_field = entry.pattern.as_deref() == Some(raw.as_str())
                        && !raw.trim().starts_with('[');
                    let parsed = if is_pattern_field {
                        Regex::new(&format!("(?i){}", raw.trim())).map(SearchTerm::Pattern)
                    } else {
                        SearchTerm::parse(raw)
                    };
                    let term = parsed.map_err(|source| TaxonomyError::InvalidPattern {
                        owner: entry.code.clone(),
                        pattern: raw.clone(),
                        source,
                    })?;
                    decisions.push(Decision {
                        gate,
                        term,
                        type_index,
                    });
                }
            }
        }

        log::debug!(
            "[Taxonomy] Compiled {} decisions over {} manufacturers, {} types",
            decisions.len(),
            gates.len(),
            types.len()
        );

        Ok(Self {
            gates,
            decisions,
            types,
        })
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    fn gate_passes(&self, gate: usize, title: &str, memo: &mut [Option<bool>]) -> bool {
        *memo[gate].get_or_insert_with(|| self.gates[gate].iter().any(|t| t.is_match(title)))
    }

    fn decision_matches(&self, idx: usize, title: &str, memo: &mut [Option<bool>]) -> bool {
        let decision = &self.decisions[idx];
        self.gate_passes(decision.gate, title, memo) && decision.term.is_match(title)
    }
}

/// Memo of earlier classification work within one run.
///
/// Whole titles map straight to their outcome. Literal terms that produced
/// a match are kept by decision index; a title containing one of them only
/// needs the decisions before that index checked.
#[derive(Debug, Default)]
pub struct MatchCache {
    titles: HashMap<String, Option<usize>>,
    terms: BTreeMap<usize, String>,
    hits: usize,
}

impl MatchCache {
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn clear(&mut self) {
        self.titles.clear();
        self.terms.clear();
        self.hits = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeMatch<'a> {
    pub info: &'a TypeInfo,
    /// The search term (or pattern source) that matched.
    pub term: &'a str,
}

pub struct TypeMatcher<'a> {
    list: &'a DecisionList,
    cache: MatchCache,
}

impl<'a> TypeMatcher<'a> {
    pub fn new(list: &'a DecisionList) -> Self {
        Self {
            list,
            cache: MatchCache::default(),
        }
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    pub fn match_title(&mut self, title: &str) -> Option<TypeMatch<'a>> {
        let list = self.list;
        let lower = title.to_lowercase();

        if let Some(&cached) = self.cache.titles.get(&lower) {
            self.cache.hits += 1;
            return cached.map(|idx| Self::to_match(list, idx));
        }

        let mut gates = vec![None; list.gates.len()];

        let bound = self
            .cache
            .terms
            .iter()
            .find(|(idx, term)| {
                lower.contains(term.as_str())
                    && list.gate_passes(list.decisions[**idx].gate, &lower, &mut gates)
            })
            .map(|(idx, _)| *idx);
        if bound.is_some() {
            self.cache.hits += 1;
        }

        let limit = bound.unwrap_or(list.decisions.len());
        let found = (0..limit)
            .find(|&idx| list.decision_matches(idx, &lower, &mut gates))
            .or(bound);

        if let Some(idx) = found {
            if let SearchTerm::Literal(term) = &list.decisions[idx].term {
                self.cache.terms.entry(idx).or_insert_with(|| term.clone());
            }
        }
        self.cache.titles.insert(lower, found);

        found.map(|idx| Self::to_match(list, idx))
    }

    fn to_match(list: &'a DecisionList, idx: usize) -> TypeMatch<'a> {
        let decision = &list.decisions[idx];
        TypeMatch {
            info: &list.types[decision.type_index],
            term: decision.term.as_str(),
        }
    }
}
