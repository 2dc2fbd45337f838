/// Sparse multivariate polynomials with integer coefficients.
///
/// A [`Polynomial`] is always stored fully expanded: a map from monomial to
/// non-zero coefficient. Two polynomials denote the same identity over
/// their free variables exactly when their maps are equal, which is what
/// the symbolic equality oracle relies on.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolyError {
    #[error("no value bound for variable '{0}'")]
    UnboundVariable(String),
}

/// Product of named variables raised to positive exponents.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monomial(BTreeMap<String, u32>);

impl Monomial {
    /// The empty product.
    pub fn unit() -> Self {
        Monomial(BTreeMap::new())
    }

    pub fn var(name: &str) -> Self {
        let mut powers = BTreeMap::new();
        powers.insert(name.to_string(), 1);
        Monomial(powers)
    }

    pub fn degree(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_unit(&self) -> bool {
        self.0.is_empty()
    }

    pub fn exponent(&self, name: &str) -> u32 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn product(&self, other: &Monomial) -> Monomial {
        let mut powers = self.0.clone();
        for (name, e) in &other.0 {
            *powers.entry(name.clone()).or_insert(0) += e;
        }
        Monomial(powers)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unit() {
            return write!(f, "1");
        }
        let mut first = true;
        for (name, &e) in &self.0 {
            if !first {
                write!(f, "*")?;
            }
            first = false;
            if e == 1 {
                write!(f, "{}", name)?;
            } else {
                write!(f, "{}^{}", name, e)?;
            }
        }
        Ok(())
    }
}

/// Expanded polynomial over named variables with `BigInt` coefficients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, BigInt>,
}

impl Polynomial {
    pub fn constant(c: impl Into<BigInt>) -> Self {
        let mut p = Polynomial::default();
        p.add_term(Monomial::unit(), c.into());
        p
    }

    pub fn var(name: &str) -> Self {
        let mut p = Polynomial::default();
        p.add_term(Monomial::var(name), BigInt::one());
        p
    }

    /// `coefficient·scale + offset` for two named variables.
    pub fn affine(coefficient: impl Into<BigInt>, scale: &str, offset: &str) -> Self {
        Polynomial::constant(coefficient) * Polynomial::var(scale) + Polynomial::var(offset)
    }

    /// Expanded normal form: monomial → non-zero coefficient.
    pub fn normal_form(&self) -> &BTreeMap<Monomial, BigInt> {
        &self.terms
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Total degree; the zero polynomial has degree 0.
    pub fn degree(&self) -> u32 {
        self.terms.keys().map(Monomial::degree).max().unwrap_or(0)
    }

    pub fn coefficient(&self, monomial: &Monomial) -> BigInt {
        self.terms.get(monomial).cloned().unwrap_or_else(BigInt::zero)
    }

    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .terms
            .keys()
            .flat_map(|m| m.variables().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn pow(&self, exp: u32) -> Polynomial {
        num_traits::pow(self.clone(), exp as usize)
    }

    /// Evaluate at integer bindings for every variable that occurs.
    pub fn evaluate(&self, bindings: &HashMap<&str, BigInt>) -> Result<BigInt, PolyError> {
        let mut total = BigInt::zero();
        for (monomial, coeff) in &self.terms {
            let mut term = coeff.clone();
            for (name, &e) in &monomial.0 {
                let value = bindings
                    .get(name.as_str())
                    .ok_or_else(|| PolyError::UnboundVariable(name.clone()))?;
                term *= num_traits::pow(value.clone(), e as usize);
            }
            total += term;
        }
        Ok(total)
    }

    fn add_term(&mut self, monomial: Monomial, coeff: BigInt) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.entry(monomial) {
            Entry::Occupied(mut e) => {
                *e.get_mut() += coeff;
                if e.get().is_zero() {
                    e.remove();
                }
            }
            Entry::Vacant(e) => {
                e.insert(coeff);
            }
        }
    }
}

impl From<BigInt> for Polynomial {
    fn from(c: BigInt) -> Self {
        Polynomial::constant(c)
    }
}

impl From<i64> for Polynomial {
    fn from(c: i64) -> Self {
        Polynomial::constant(c)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: Polynomial) -> Polynomial {
        for (m, c) in rhs.terms {
            self.add_term(m, c);
        }
        self
    }
}

impl<'a> Add<&'a Polynomial> for &'a Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &'a Polynomial) -> Polynomial {
        self.clone() + rhs.clone()
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(mut self) -> Polynomial {
        for c in self.terms.values_mut() {
            *c = -c.clone();
        }
        self
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        self + (-rhs)
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl<'a> Mul<&'a Polynomial> for &'a Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &'a Polynomial) -> Polynomial {
        let mut out = Polynomial::default();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                out.add_term(m1.product(m2), c1 * c2);
            }
        }
        out
    }
}

impl Zero for Polynomial {
    fn zero() -> Self {
        Polynomial::default()
    }

    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }
}

impl One for Polynomial {
    fn one() -> Self {
        Polynomial::constant(1)
    }
}

impl fmt::Display for Polynomial {
    /// Graded lexicographic order, highest degree first, with variables
    /// ranked in reverse name order (`n` before `m`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let mut names = self.variables();
        names.reverse();
        let key = |m: &Monomial| -> (u32, Vec<u32>) {
            (m.degree(), names.iter().map(|v| m.exponent(v)).collect())
        };
        let mut ordered: Vec<(&Monomial, &BigInt)> = self.terms.iter().collect();
        ordered.sort_by(|(a, _), (b, _)| key(b).cmp(&key(a)));

        for (i, (monomial, coeff)) in ordered.into_iter().enumerate() {
            let magnitude = coeff.abs();
            if i == 0 {
                if coeff.is_negative() {
                    write!(f, "-")?;
                }
            } else if coeff.is_negative() {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            if monomial.is_unit() {
                write!(f, "{}", magnitude)?;
            } else if magnitude.is_one() {
                write!(f, "{}", monomial)?;
            } else {
                write!(f, "{}*{}", magnitude, monomial)?;
            }
        }
        Ok(())
    }
}
