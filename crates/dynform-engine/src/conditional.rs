//! Conditional Evaluator
//!
//! Decides whether a [`ConditionalRule`] fires for the current value of the
//! field it depends on. Comparison is numeric when both sides read as
//! numbers and lexical otherwise. The evaluator never fails: an unknown
//! operator, an absent dependency or a non-scalar value simply yields a verdict.

use crate::schema::{ConditionalRule, Operand, Operator};
use crate::value::{format_number, parse_number, FieldValue};
use std::cmp::Ordering;

/// One side of a comparison after coercion
#[derive(Debug, PartialEq)]
enum Comparable {
    Number(f64),
    Text(String),
}

impl Comparable {
    fn from_value(value: &FieldValue) -> Option<Self> {
        if let Some(n) = value.as_number() {
            return Some(Self::Number(n));
        }
        value.as_text().map(Self::Text)
    }

    fn from_operand(operand: &Operand) -> Self {
        match operand {
            Operand::Number(n) => Self::Number(*n),
            Operand::Text(s) => parse_number(s)
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(s.clone())),
        }
    }

    fn into_text(self) -> String {
        match self {
            Self::Number(n) => format_number(n),
            Self::Text(s) => s,
        }
    }
}

/// Whether `rule` makes its field required given the dependency's value
pub fn evaluate(rule: &ConditionalRule, dependent: Option<&FieldValue>) -> bool {
    let ordering = match dependent.and_then(Comparable::from_value) {
        Some(lhs) => compare(lhs, Comparable::from_operand(&rule.value)),
        // Absent, file and non-scalar values compare as unequal to everything
        None => None,
    };

    let verdict = match (&rule.operator, ordering) {
        (Operator::Unknown(token), _) => {
            tracing::debug!(operator = %token, "unknown conditional operator, rule disabled");
            false
        }
        (Operator::Ne, None) => true,
        (_, None) => false,
        (Operator::Gt, Some(o)) => o == Ordering::Greater,
        (Operator::Gte, Some(o)) => o != Ordering::Less,
        (Operator::Lt, Some(o)) => o == Ordering::Less,
        (Operator::Lte, Some(o)) => o != Ordering::Greater,
        (Operator::Eq, Some(o)) => o == Ordering::Equal,
        (Operator::Ne, Some(o)) => o != Ordering::Equal,
    };

    tracing::trace!(
        depends_on = %rule.depends_on,
        operator = rule.operator.as_str(),
        verdict,
        "conditional evaluated"
    );
    verdict
}

fn compare(lhs: Comparable, rhs: Comparable) -> Option<Ordering> {
    match (lhs, rhs) {
        (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(&b),
        (lhs, rhs) => Some(lhs.into_text().cmp(&rhs.into_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rule(operator: &str, value: Operand) -> ConditionalRule {
        ConditionalRule::new("loan_amount", Operator::from(operator), value)
    }

    #[test]
    fn test_loan_threshold() {
        let r = rule("gt", Operand::Number(100000.0));
        assert!(evaluate(&r, Some(&FieldValue::from(150000))));
        assert!(!evaluate(&r, Some(&FieldValue::from(100000))));
        assert!(!evaluate(&r, Some(&FieldValue::from(50000))));
    }

    #[test]
    fn test_numeric_text_is_numeric() {
        let r = rule("gt", Operand::Number(100000.0));
        // Lexically "99999" > "100000"; numerically it is not
        assert!(!evaluate(&r, Some(&FieldValue::from("99999"))));
        assert!(evaluate(&r, Some(&FieldValue::from("150000"))));

        let r = rule("eq", Operand::Text("100000".into()));
        assert!(evaluate(&r, Some(&FieldValue::from(100000))));
        assert!(evaluate(&r, Some(&FieldValue::from("100000.0"))));
    }

    #[test]
    fn test_lexical_fallback() {
        let r = rule("eq", Operand::Text("Self-Employed".into()));
        assert!(evaluate(&r, Some(&FieldValue::from("Self-Employed"))));
        assert!(!evaluate(&r, Some(&FieldValue::from("Employed"))));

        let r = rule("ne", Operand::Text("Employed".into()));
        assert!(evaluate(&r, Some(&FieldValue::from("Unemployed"))));

        // Non-numeric text against a number compares as strings
        let r = rule("lt", Operand::Number(5.0));
        assert!(!evaluate(&r, Some(&FieldValue::from("abc"))));
        assert!(evaluate(&r, Some(&FieldValue::from("4a"))));
    }

    #[test]
    fn test_boolean_dependency() {
        let r = rule("eq", Operand::Text("true".into()));
        assert!(evaluate(&r, Some(&FieldValue::Bool(true))));
        assert!(!evaluate(&r, Some(&FieldValue::Bool(false))));
    }

    #[test]
    fn test_absent_dependency() {
        for op in ["gt", "gte", "lt", "lte", "eq"] {
            assert!(!evaluate(&rule(op, Operand::Number(0.0)), None), "{}", op);
        }
        assert!(evaluate(&rule("ne", Operand::Number(0.0)), None));
    }

    #[test]
    fn test_unknown_operator_is_false() {
        let r = rule("between", Operand::Number(1.0));
        assert!(!evaluate(&r, Some(&FieldValue::from(1))));
        assert!(!evaluate(&r, Some(&FieldValue::from("anything"))));
        assert!(!evaluate(&r, None));
    }

    proptest! {
        #[test]
        fn prop_numeric_semantics(a in -1.0e9f64..1.0e9, b in -1.0e9f64..1.0e9) {
            let value = FieldValue::Number(a);
            let operand = Operand::Number(b);
            prop_assert_eq!(evaluate(&rule("gt", operand.clone()), Some(&value)), a > b);
            prop_assert_eq!(evaluate(&rule("gte", operand.clone()), Some(&value)), a >= b);
            prop_assert_eq!(evaluate(&rule("lt", operand.clone()), Some(&value)), a < b);
            prop_assert_eq!(evaluate(&rule("lte", operand.clone()), Some(&value)), a <= b);
            prop_assert_eq!(evaluate(&rule("eq", operand.clone()), Some(&value)), a == b);
            prop_assert_eq!(evaluate(&rule("ne", operand), Some(&value)), a != b);
        }

        #[test]
        fn prop_unknown_operator_never_fires(token in "[a-z]{4,10}", text in ".*") {
            let r = rule(&token, Operand::Text(text.clone()));
            prop_assert!(!evaluate(&r, Some(&FieldValue::Text(text))));
        }
    }
}
