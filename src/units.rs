//! Unit-registry capability and a self-contained pint-style implementation.
//!
//! The codec layer never reads a process-wide default registry: whichever
//! registry a deployment uses is passed into the codec constructors, and its
//! `id` becomes the `pint_unit_registry` discriminator on the wire.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{CodecError, CodecResult};
use crate::types::NdArray;

// ---------------------------------------------------------------------------
// UnitRegistry trait
// ---------------------------------------------------------------------------

/// A source of units: parses unit tokens and names the registry they belong to.
pub trait UnitRegistry: Send + Sync {
    /// Stable registry identifier, written as the wire discriminator.
    fn id(&self) -> &str;

    /// Parse a unit token (e.g. `"meter / second ** 2"`) into a normalized
    /// unit expression.
    fn parse_unit(&self, token: &str) -> CodecResult<UnitExpr>;
}

// ---------------------------------------------------------------------------
// UnitExpr
// ---------------------------------------------------------------------------

/// A normalized unit: a map from canonical unit names to integer exponents.
/// Two expressions are equal iff they come from the same registry and reduce
/// to the same exponents, so `meter/second**2` == `meter * second**-2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitExpr {
    registry_id: String,
    exponents: BTreeMap<String, i32>,
}

impl UnitExpr {
    pub fn from_exponents(registry_id: impl Into<String>, exponents: BTreeMap<String, i32>) -> Self {
        let exponents = exponents.into_iter().filter(|(_, e)| *e != 0).collect();
        Self {
            registry_id: registry_id.into(),
            exponents,
        }
    }

    /// Dimensionless unit for a registry.
    pub fn dimensionless(registry_id: impl Into<String>) -> Self {
        Self::from_exponents(registry_id, BTreeMap::new())
    }

    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    pub fn exponents(&self) -> &BTreeMap<String, i32> {
        &self.exponents
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents.is_empty()
    }

    /// Render the canonical token: alphabetical numerator terms joined by
    /// ` * `, then one ` / term` per denominator unit, exponents as ` ** n`.
    /// `parse_unit(expr.token())` always reproduces `expr`.
    pub fn token(&self) -> String {
        if self.exponents.is_empty() {
            return "dimensionless".to_string();
        }
        let mut numer: Vec<String> = Vec::new();
        let mut denom: Vec<String> = Vec::new();
        for (name, &exp) in &self.exponents {
            if exp > 0 {
                numer.push(render_term(name, exp));
            } else {
                denom.push(render_term(name, -exp));
            }
        }
        let mut out = if numer.is_empty() {
            "1".to_string()
        } else {
            numer.join(" * ")
        };
        for term in denom {
            out.push_str(" / ");
            out.push_str(&term);
        }
        out
    }
}

fn render_term(name: &str, exp: i32) -> String {
    if exp == 1 {
        name.to_string()
    } else {
        format!("{name} ** {exp}")
    }
}

impl std::fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// Magnitude of a [`Quantity`]: a scalar or a whole numeric array.
#[derive(Debug, Clone, PartialEq)]
pub enum Magnitude {
    Int(i64),
    Float(f64),
    Array(NdArray),
}

/// A physical quantity: magnitude plus unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    magnitude: Magnitude,
    unit: UnitExpr,
}

impl Quantity {
    pub fn new(magnitude: Magnitude, unit: UnitExpr) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    pub fn unit(&self) -> &UnitExpr {
        &self.unit
    }
}

// ---------------------------------------------------------------------------
// SimpleUnitRegistry
// ---------------------------------------------------------------------------

/// In-crate unit registry: a fixed set of unit names plus aliases, with a
/// token grammar of `*`, `/` and integer `**` exponents.
#[derive(Debug, Clone)]
pub struct SimpleUnitRegistry {
    id: String,
    units: BTreeSet<String>,
    aliases: HashMap<String, String>,
}

impl SimpleUnitRegistry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            units: BTreeSet::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registry preloaded with the unit names the settings models in the
    /// wild actually use.
    pub fn with_defaults(id: impl Into<String>) -> Self {
        let mut reg = Self::new(id);
        for unit in [
            "meter", "second", "gram", "kilogram", "kelvin", "mole", "ampere",
            "candela", "radian", "nanometer", "angstrom", "picosecond",
            "femtosecond", "dalton", "joule", "newton", "pascal", "bar",
            "calorie", "kilocalorie", "kilojoule", "atmosphere",
        ] {
            reg.add_unit(unit);
        }
        for (alias, canonical) in [
            ("m", "meter"),
            ("s", "second"),
            ("g", "gram"),
            ("kg", "kilogram"),
            ("K", "kelvin"),
            ("mol", "mole"),
            ("A", "ampere"),
            ("nm", "nanometer"),
            ("ps", "picosecond"),
            ("fs", "femtosecond"),
            ("J", "joule"),
            ("N", "newton"),
            ("Pa", "pascal"),
            ("cal", "calorie"),
            ("kcal", "kilocalorie"),
            ("kJ", "kilojoule"),
            ("atm", "atmosphere"),
            ("amu", "dalton"),
        ] {
            reg.add_alias(alias, canonical);
        }
        reg
    }

    pub fn add_unit(&mut self, name: impl Into<String>) -> &mut Self {
        self.units.insert(name.into());
        self
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) -> &mut Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    fn canonical_name(&self, name: &str) -> CodecResult<String> {
        let resolved = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        if self.units.contains(resolved) {
            Ok(resolved.to_string())
        } else {
            Err(CodecError::UnitParse(format!(
                "unknown unit `{name}` in registry `{}`",
                self.id
            )))
        }
    }
}

impl UnitRegistry for SimpleUnitRegistry {
    fn id(&self) -> &str {
        &self.id
    }

    fn parse_unit(&self, token: &str) -> CodecResult<UnitExpr> {
        let mut parser = TokenParser::new(token);
        let mut exponents: BTreeMap<String, i32> = BTreeMap::new();
        let mut divide = false;
        loop {
            let factor = parser.factor()?;
            if let Some((name, exp)) = factor {
                let name = self.canonical_name(&name)?;
                let exp = if divide { -exp } else { exp };
                *exponents.entry(name).or_insert(0) += exp;
            }
            match parser.operator()? {
                Some(Op::Mul) => divide = false,
                Some(Op::Div) => divide = true,
                None => break,
            }
        }
        Ok(UnitExpr::from_exponents(self.id.clone(), exponents))
    }
}

// ---------------------------------------------------------------------------
// Token grammar
// ---------------------------------------------------------------------------

enum Op {
    Mul,
    Div,
}

struct TokenParser<'a> {
    rest: &'a str,
}

impl<'a> TokenParser<'a> {
    fn new(token: &'a str) -> Self {
        Self { rest: token }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// One factor: a unit name or the literal `1`, optionally `** <int>`.
    /// `dimensionless` and `1` contribute nothing and return `None`.
    fn factor(&mut self) -> CodecResult<Option<(String, i32)>> {
        self.skip_ws();
        if let Some(stripped) = self.rest.strip_prefix('1') {
            if !stripped.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
                self.rest = stripped;
                return Ok(None);
            }
        }
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(CodecError::UnitParse(format!(
                "expected unit name at `{}`",
                self.rest
            )));
        }
        let name = self.rest[..end].to_string();
        self.rest = &self.rest[end..];
        if name == "dimensionless" {
            return Ok(None);
        }
        let exp = self.exponent()?;
        Ok(Some((name, exp)))
    }

    /// Optional `** <int>` suffix; defaults to 1.
    fn exponent(&mut self) -> CodecResult<i32> {
        self.skip_ws();
        let Some(stripped) = self.rest.strip_prefix("**") else {
            return Ok(1);
        };
        self.rest = stripped.trim_start();
        let end = self
            .rest
            .char_indices()
            .find(|(i, c)| !(*i == 0 && *c == '-') && !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let digits = &self.rest[..end];
        let exp: i32 = digits
            .parse()
            .map_err(|_| CodecError::UnitParse(format!("bad exponent `{digits}`")))?;
        self.rest = &self.rest[end..];
        Ok(exp)
    }

    /// Next `*` or `/`, or end of input.
    fn operator(&mut self) -> CodecResult<Option<Op>> {
        self.skip_ws();
        if self.rest.is_empty() {
            return Ok(None);
        }
        if let Some(stripped) = self.rest.strip_prefix('*') {
            self.rest = stripped;
            return Ok(Some(Op::Mul));
        }
        if let Some(stripped) = self.rest.strip_prefix('/') {
            self.rest = stripped;
            return Ok(Some(Op::Div));
        }
        Err(CodecError::UnitParse(format!(
            "unexpected input at `{}`",
            self.rest
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reg() -> SimpleUnitRegistry {
        SimpleUnitRegistry::with_defaults("openff_units")
    }

    #[test]
    fn acceleration_token_round_trips() {
        let unit = reg().parse_unit("meter/second**2").unwrap();
        assert_eq!(unit.token(), "meter / second ** 2");
        assert_eq!(reg().parse_unit(&unit.token()).unwrap(), unit);
    }

    #[test]
    fn spelling_variants_normalize() {
        let reg = reg();
        let a = reg.parse_unit("meter / second ** 2").unwrap();
        let b = reg.parse_unit("meter * second ** -2").unwrap();
        let c = reg.parse_unit("m/s**2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn pure_denominator_renders_with_leading_one() {
        let unit = reg().parse_unit("1 / second").unwrap();
        assert_eq!(unit.token(), "1 / second");
        assert_eq!(reg().parse_unit(&unit.token()).unwrap(), unit);
    }

    #[test]
    fn dimensionless_forms() {
        let reg = reg();
        let unit = reg.parse_unit("dimensionless").unwrap();
        assert!(unit.is_dimensionless());
        assert_eq!(unit.token(), "dimensionless");
        // Exponents that cancel collapse to dimensionless too.
        let cancelled = reg.parse_unit("second / second").unwrap();
        assert_eq!(cancelled, unit);
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let err = reg().parse_unit("meter / fortnight").unwrap_err();
        assert!(matches!(err, CodecError::UnitParse(_)));
    }

    #[test]
    fn numerator_terms_sort_alphabetically() {
        let unit = reg().parse_unit("second * kilogram * meter").unwrap();
        assert_eq!(unit.token(), "kilogram * meter * second");
    }
}
