//! Arithmetic on variables and linear expressions.
//!
//! Only the forms needed to write nutrient rows and category links are
//! provided: scaling a variable, adding or subtracting variables, and adding or
//! subtracting whole expressions.
//!
//! ```ignore
//! let used = builder.add_variable("category_used[Dairy]", VariableType::Binary, 0.0, 1.0);
//! let link = milk + yogurt - 300.0 * used;
//! ```
//!
//! Every result keeps the brand of its operands, so variables of different
//! models cannot be combined.

use std::ops::{Add, Mul, Sub};

use super::{LinearExpression, VariableId};

impl<Brand> Add for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(mut self, other: LinearExpression<Brand>) -> Self::Output {
        self.terms.extend(other.terms);
        self.constant += other.constant;
        self
    }
}

impl<Brand> Sub for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: LinearExpression<Brand>) -> Self::Output {
        self + other * -1.0
    }
}

impl<Brand> Add<VariableId<Brand>> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(mut self, other: VariableId<Brand>) -> Self::Output {
        self.add_term(1.0, other);
        self
    }
}

impl<Brand> Sub<VariableId<Brand>> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(mut self, other: VariableId<Brand>) -> Self::Output {
        self.add_term(-1.0, other);
        self
    }
}

impl<Brand> Mul<f64> for LinearExpression<Brand> {
    type Output = LinearExpression<Brand>;

    fn mul(mut self, factor: f64) -> Self::Output {
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl<Brand> Mul<VariableId<Brand>> for f64 {
    type Output = LinearExpression<Brand>;

    fn mul(self, variable: VariableId<Brand>) -> Self::Output {
        [(self, variable)].into_iter().collect()
    }
}

impl<Brand> Add for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn add(self, other: VariableId<Brand>) -> Self::Output {
        LinearExpression::from_variable(self) + other
    }
}

impl<Brand> Sub for VariableId<Brand> {
    type Output = LinearExpression<Brand>;

    fn sub(self, other: VariableId<Brand>) -> Self::Output {
        LinearExpression::from_variable(self) - other
    }
}

#[cfg(test)]
mod tests {
    use crate::lp_model_builder;
    use crate::lp_solver::VariableType;

    #[test]
    fn test_category_link_expression() {
        let mut builder = lp_model_builder!();
        let milk = builder.add_variable("milk", VariableType::Continuous, 0.0, 300.0);
        let yogurt = builder.add_variable("yogurt", VariableType::Continuous, 0.0, 300.0);
        let used = builder.add_variable("used", VariableType::Binary, 0.0, 1.0);

        let link = milk + yogurt - 300.0 * used;
        assert_eq!(link.compact(), vec![(0, 1.0), (1, 1.0), (2, -300.0)]);
        assert_eq!(link.constant, 0.0);
        assert_eq!(link.evaluate(&[100.0, 50.0, 1.0]), -150.0);
    }

    #[test]
    fn test_subtraction_negates_right_hand_side() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0);
        let y = builder.add_variable("y", VariableType::Binary, 0.0, 1.0);

        let expr = (2.0 * x - y) - (0.5 * x - 3.0 * y);
        assert_eq!(expr.compact(), vec![(0, 1.5), (1, 2.0)]);

        let scaled = (x - y) * 4.0;
        assert_eq!(scaled.evaluate(&[2.0, 1.0]), 4.0);
    }

    #[test]
    fn test_variable_id_debug() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0);

        let debug_str = format!("{:?}", x);
        assert!(debug_str.contains("VariableId"));
    }
}
