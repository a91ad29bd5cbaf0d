//! Heuristic text relevance between a query and an entity's textual fields.
//!
//! Each field is scored in tiers (exact, prefix, substring) plus a bonus when the query appears
//! as a whole word. The per-field points are scaled by a field weight and summed. The result is a
//! plain non-negative integer: `0` means "no match" and anything else can be ordered directly.

use crate::entity::SearchableEntity;

/// Points awarded per field before field weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelevanceWeights {
    /// Whole field equals the query
    pub exact: u32,
    /// Field starts with the query
    pub prefix: u32,
    /// Field contains the query anywhere
    pub substring: u32,
    /// Added when the query occurs bounded by spaces or the string edges
    pub whole_word: u32,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            exact: 100,
            prefix: 50,
            substring: 25,
            whole_word: 30,
        }
    }
}

impl RelevanceWeights {
    /// An exact match must outscore every non-exact outcome, bonus included.
    pub const fn exact_dominates(&self) -> bool {
        self.exact > self.prefix.saturating_add(self.whole_word)
            && self.exact > self.substring.saturating_add(self.whole_word)
            && self.prefix >= self.substring
    }
}

/// Percentage applied to each field's points. The name carries the most weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldWeights {
    pub name: u32,
    pub description: u32,
    pub category: u32,
    pub region: u32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 100,
            description: 25,
            category: 50,
            region: 50,
        }
    }
}

/// The textual fields scored for an entity, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Name,
    Description,
    Category,
    Region,
}

impl FieldWeights {
    pub const fn weight(&self, field: TextField) -> u32 {
        match field {
            TextField::Name => self.name,
            TextField::Description => self.description,
            TextField::Category => self.category,
            TextField::Region => self.region,
        }
    }
}

/// A trimmed, lower-cased query term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NormalizedQuery {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelevanceScorer {
    weights: RelevanceWeights,
    fields: FieldWeights,
}

impl RelevanceScorer {
    pub const fn new(weights: RelevanceWeights, fields: FieldWeights) -> Self {
        Self { weights, fields }
    }

    pub const fn weights(&self) -> &RelevanceWeights {
        &self.weights
    }

    /// Unweighted points for a single piece of text.
    pub fn score_field(&self, query: &NormalizedQuery, field: &str) -> u32 {
        let q = query.as_str();
        if q.is_empty() {
            return 0;
        }
        let field = field.trim().to_lowercase();
        if field.is_empty() {
            return 0;
        }
        if field == q {
            return self.weights.exact;
        }

        let base = if field.starts_with(q) {
            self.weights.prefix
        } else if field.contains(q) {
            self.weights.substring
        } else {
            return 0;
        };
        if contains_whole_word(&field, q) {
            base.saturating_add(self.weights.whole_word)
        } else {
            base
        }
    }

    /// Weighted sum over `(field, text)` pairs; absent fields contribute nothing.
    ///
    /// Saturates at `u32::MAX` for very large custom points.
    pub fn score_fields<'a>(
        &self,
        query: &NormalizedQuery,
        fields: impl IntoIterator<Item = (TextField, Option<&'a str>)>,
    ) -> u32 {
        if query.is_empty() {
            return 0;
        }
        fields
            .into_iter()
            .filter_map(|(field, text)| text.map(|text| (field, text)))
            .map(|(field, text)| {
                let points = self.score_field(query, text);
                points.saturating_mul(self.fields.weight(field)) / 100
            })
            .fold(0, u32::saturating_add)
    }

    pub fn score_entity(&self, query: &NormalizedQuery, entity: &SearchableEntity) -> u32 {
        self.score_fields(
            query,
            [
                (TextField::Name, Some(entity.name())),
                (TextField::Description, Some(entity.description())),
                (TextField::Category, entity.category_label()),
                (TextField::Region, entity.region_label()),
            ],
        )
    }
}

/// True when `needle` occurs in `haystack` bounded by spaces or the string edges.
fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let left_ok = haystack[..start].chars().next_back().is_none_or(|c| c == ' ');
        let right_ok = haystack[end..].chars().next().is_none_or(|c| c == ' ');
        if left_ok && right_ok {
            return true;
        }
        // Step one character past this occurrence so overlapping matches are considered.
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
        if from >= haystack.len() {
            break;
        }
    }
    false
}
