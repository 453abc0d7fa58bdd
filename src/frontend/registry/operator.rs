//! Operator definitions
//!
//! An operator is described by its display form: a sequence of keywords and
//! named placeholders, optionally with one inner-parameter slot attached
//! directly after a keyword. `$a ~~ [] ~~ $b` reads as placeholder `a`,
//! keyword `~~`, a parameter slot, keyword `~~`, placeholder `b`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::{OperatorId, RegistryError};
use crate::frontend::category::CategoryId;
use crate::frontend::tokens::{classify_word, TokenKind};

/// One element of a display form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormPart {
    Keyword(String),
    Placeholder(String),
    Params(ParamSpec),
}

/// Directional tightness override for an outer placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tightness {
    /// Operand may be of the operator's own category (or tighter)
    Same,
    /// Operand must be strictly tighter
    Strict,
}

/// A named inner parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSlot {
    pub name: String,
    #[serde(default = "default_arity")]
    pub arity: usize,
    /// `None` marks a mandatory parameter
    #[serde(default)]
    pub default: Option<Vec<String>>,
}

fn default_arity() -> usize {
    1
}

impl ParamSlot {
    pub fn mandatory(
        name: impl Into<String>,
        arity: usize,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            default: None,
        }
    }

    /// Optional parameter; its arity is the number of default values
    pub fn optional(
        name: impl Into<String>,
        default: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            arity: default.len(),
            default: Some(default.iter().map(|v| v.to_string()).collect()),
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.default.is_none()
    }
}

/// Inner-parameter specification
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamSpec {
    pub slots: Vec<ParamSlot>,
}

impl ParamSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        slot: ParamSlot,
    ) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn find(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    /// Slot names, comma separated
    pub fn describe(&self) -> String {
        self.slots
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Operator shape, derived from the display form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Prefix,
    Postfix,
    Infix,
    Closed,
    Mixfix,
}

/// Keyword/placeholder sequence used for duplicate detection. Placeholder
/// names and parameter slots do not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Skeleton(Vec<Option<String>>);

impl fmt::Display for Skeleton {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|p| p.as_deref().unwrap_or("_"))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// User-facing operator definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDefinition {
    pub name: String,
    pub form: Vec<FormPart>,
    #[serde(default)]
    pub left: Option<Tightness>,
    #[serde(default)]
    pub right: Option<Tightness>,
}

impl OperatorDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            form: Vec::new(),
            left: None,
            right: None,
        }
    }

    /// Parse a form written as space-separated words: `$x` is a
    /// placeholder, `[]` a parameter slot, anything else a keyword.
    pub fn from_notation(
        name: impl Into<String>,
        notation: &str,
    ) -> Result<Self, RegistryError> {
        let mut def = Self::new(name);
        for word in notation.split_whitespace() {
            if word == "[]" {
                def.form.push(FormPart::Params(ParamSpec::default()));
            } else if let Some(hole) = word.strip_prefix('$') {
                if hole.is_empty() {
                    return Err(RegistryError::InvalidForm {
                        name: def.name,
                        reason: "placeholder without a name".to_string(),
                    });
                }
                def.form.push(FormPart::Placeholder(hole.to_string()));
            } else {
                def.form.push(FormPart::Keyword(word.to_string()));
            }
        }
        Ok(def)
    }

    pub fn keyword(
        mut self,
        text: impl Into<String>,
    ) -> Self {
        self.form.push(FormPart::Keyword(text.into()));
        self
    }

    pub fn hole(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.form.push(FormPart::Placeholder(name.into()));
        self
    }

    /// Attach an inner-parameter spec. Fills an existing `[]` slot, or
    /// appends one after the most recent keyword.
    pub fn params(
        mut self,
        spec: ParamSpec,
    ) -> Self {
        if let Some(FormPart::Params(slot)) = self
            .form
            .iter_mut()
            .find(|p| matches!(p, FormPart::Params(_)))
        {
            *slot = spec;
            return self;
        }
        let at = self
            .form
            .iter()
            .rposition(|p| matches!(p, FormPart::Keyword(_)))
            .map_or(self.form.len(), |k| k + 1);
        self.form.insert(at, FormPart::Params(spec));
        self
    }

    pub fn left(
        mut self,
        tightness: Tightness,
    ) -> Self {
        self.left = Some(tightness);
        self
    }

    pub fn right(
        mut self,
        tightness: Tightness,
    ) -> Self {
        self.right = Some(tightness);
        self
    }

    fn invalid(
        &self,
        reason: impl Into<String>,
    ) -> RegistryError {
        RegistryError::InvalidForm {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Check the form and derive its shape and skeleton
    pub(crate) fn validate(&self) -> Result<(Shape, Skeleton), RegistryError> {
        if self.name.is_empty() {
            return Err(self.invalid("operator name is empty"));
        }

        let mut holes = HashSet::new();
        let mut param_slots = 0;
        let mut keywords = 0;
        let mut previous: Option<&FormPart> = None;

        for part in &self.form {
            match part {
                FormPart::Keyword(text) => {
                    if !classify_word(text).is_keyword_like() {
                        return Err(self.invalid(format!(
                            "'{}' cannot be used as a keyword",
                            text
                        )));
                    }
                    keywords += 1;
                }
                FormPart::Placeholder(name) => {
                    if name.is_empty() {
                        return Err(self.invalid("placeholder without a name"));
                    }
                    if matches!(previous, Some(FormPart::Placeholder(_))) {
                        return Err(self.invalid("two placeholders are adjacent"));
                    }
                    if !holes.insert(name.as_str()) {
                        return Err(self.invalid(format!(
                            "placeholder '{}' appears twice",
                            name
                        )));
                    }
                }
                FormPart::Params(spec) => {
                    if !matches!(previous, Some(FormPart::Keyword(_))) {
                        return Err(self.invalid("parameter slot must follow a keyword"));
                    }
                    param_slots += 1;
                    validate_params(self, spec)?;
                }
            }
            previous = Some(part);
        }

        if keywords == 0 {
            return Err(self.invalid("form has no keyword"));
        }
        if param_slots > 1 {
            return Err(self.invalid("more than one parameter slot"));
        }

        let shape = shape_of(&self.form);
        let leading = matches!(self.form.first(), Some(FormPart::Placeholder(_)));
        let trailing = matches!(self.form.last(), Some(FormPart::Placeholder(_)));
        if self.left.is_some() && !leading {
            return Err(self.invalid("left tightness given but the form has no leading placeholder"));
        }
        if self.right.is_some() && !trailing {
            return Err(self.invalid("right tightness given but the form has no trailing placeholder"));
        }

        let skeleton = Skeleton(
            self.form
                .iter()
                .filter_map(|part| match part {
                    FormPart::Keyword(text) => Some(Some(text.clone())),
                    FormPart::Placeholder(_) => Some(None),
                    FormPart::Params(_) => None,
                })
                .collect(),
        );

        Ok((shape, skeleton))
    }
}

fn validate_params(
    def: &OperatorDefinition,
    spec: &ParamSpec,
) -> Result<(), RegistryError> {
    if spec.slots.is_empty() {
        return Err(def.invalid("parameter slot declares no parameters"));
    }
    let mut seen = HashSet::new();
    for slot in &spec.slots {
        if classify_word(&slot.name) != TokenKind::Identifier {
            return Err(def.invalid(format!(
                "parameter name '{}' is not an identifier",
                slot.name
            )));
        }
        if !seen.insert(slot.name.as_str()) {
            return Err(def.invalid(format!("parameter '{}' declared twice", slot.name)));
        }
        if slot.arity == 0 {
            return Err(def.invalid(format!("parameter '{}' has arity 0", slot.name)));
        }
        if let Some(default) = &slot.default {
            if default.len() != slot.arity {
                return Err(def.invalid(format!(
                    "parameter '{}' expects {} value(s) but its default has {}",
                    slot.name,
                    slot.arity,
                    default.len()
                )));
            }
        }
    }
    Ok(())
}

fn shape_of(form: &[FormPart]) -> Shape {
    let parts: Vec<&FormPart> = form
        .iter()
        .filter(|p| !matches!(p, FormPart::Params(_)))
        .collect();
    let is_hole = |p: &FormPart| matches!(p, FormPart::Placeholder(_));
    let leading = parts.first().is_some_and(|p| is_hole(p));
    let trailing = parts.last().is_some_and(|p| is_hole(p));
    let interior = parts.len().saturating_sub(usize::from(leading) + usize::from(trailing));
    let interior_holes = parts
        .iter()
        .skip(usize::from(leading))
        .take(interior)
        .filter(|p| is_hole(p))
        .count();

    match (leading, trailing) {
        (false, false) => Shape::Closed,
        _ if interior_holes > 0 => Shape::Mixfix,
        (true, true) => Shape::Infix,
        (true, false) => Shape::Postfix,
        (false, true) => Shape::Prefix,
    }
}

/// A registered operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub form: Vec<FormPart>,
    pub shape: Shape,
    pub category: CategoryId,
    pub left: Option<Tightness>,
    pub right: Option<Tightness>,
    /// Every keyword is alphabetic, so the operator is visible everywhere
    pub pronounceable: bool,
    pub(crate) skeleton: Skeleton,
}

impl Operator {
    pub(crate) fn new(
        id: OperatorId,
        def: OperatorDefinition,
        shape: Shape,
        skeleton: Skeleton,
        category: CategoryId,
    ) -> Self {
        let pronounceable = def.form.iter().all(|part| match part {
            FormPart::Keyword(text) => classify_word(text) == TokenKind::Identifier,
            _ => true,
        });
        Self {
            id,
            name: def.name,
            form: def.form,
            shape,
            category,
            left: def.left,
            right: def.right,
            pronounceable,
            skeleton,
        }
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.form.iter().filter_map(|part| match part {
            FormPart::Keyword(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Placeholder names in form order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.form.iter().filter_map(|part| match part {
            FormPart::Placeholder(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn arity(&self) -> usize {
        self.placeholders().count()
    }

    pub fn first_keyword(&self) -> Option<&str> {
        self.keywords().next()
    }

    pub fn params(&self) -> Option<&ParamSpec> {
        self.form.iter().find_map(|part| match part {
            FormPart::Params(spec) => Some(spec),
            _ => None,
        })
    }

    pub fn has_leading_hole(&self) -> bool {
        matches!(self.form.first(), Some(FormPart::Placeholder(_)))
    }

    pub fn has_trailing_hole(&self) -> bool {
        matches!(self.form.last(), Some(FormPart::Placeholder(_)))
    }

    /// Keyword text used in s-expressions: keywords joined by spaces
    pub fn symbol(&self) -> String {
        self.keywords().collect::<Vec<_>>().join(" ")
    }

    /// Form in notation syntax (`$a ~~ [] ~~ $b`)
    pub fn notation(&self) -> String {
        self.form
            .iter()
            .map(|part| match part {
                FormPart::Keyword(text) => text.clone(),
                FormPart::Placeholder(name) => format!("${}", name),
                FormPart::Params(_) => "[]".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
