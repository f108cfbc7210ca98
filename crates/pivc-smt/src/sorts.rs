use pivc_ir::types::{AtomicType, Type};

/// SMT sorts. Arrays are always indexed by `Int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SmtSort {
    Bool,
    Int,
    Real,
    Array(Box<SmtSort>),
}

impl SmtSort {
    pub fn array(element: SmtSort) -> Self {
        SmtSort::Array(Box::new(element))
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, SmtSort::Int | SmtSort::Real)
    }

    /// Element sort of an array sort.
    pub fn element(&self) -> Option<&SmtSort> {
        match self {
            SmtSort::Array(element) => Some(element),
            _ => None,
        }
    }
}

impl std::fmt::Display for SmtSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmtSort::Bool => write!(f, "Bool"),
            SmtSort::Int => write!(f, "Int"),
            SmtSort::Real => write!(f, "Real"),
            SmtSort::Array(element) => write!(f, "(Array Int {element})"),
        }
    }
}

/// Sort of an array element type.
pub fn sort_of_atomic(atomic: AtomicType) -> SmtSort {
    match atomic {
        AtomicType::Int => SmtSort::Int,
        AtomicType::Float => SmtSort::Real,
        AtomicType::Bool => SmtSort::Bool,
    }
}

/// Sort of a program-logic type. Every encoding decision goes through here.
pub fn sort_of_type(ty: &Type) -> SmtSort {
    match ty {
        Type::Int => SmtSort::Int,
        Type::Float => SmtSort::Real,
        Type::Bool => SmtSort::Bool,
        Type::Array(at) => SmtSort::array(sort_of_atomic(at.element)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivc_ir::types::Variable;

    #[test]
    fn scalar_types_map_to_scalar_sorts() {
        assert_eq!(sort_of_type(&Type::Int), SmtSort::Int);
        assert_eq!(sort_of_type(&Type::Float), SmtSort::Real);
        assert_eq!(sort_of_type(&Type::Bool), SmtSort::Bool);
    }

    #[test]
    fn array_types_map_to_int_indexed_arrays() {
        for (atomic, element) in [
            (AtomicType::Int, SmtSort::Int),
            (AtomicType::Float, SmtSort::Real),
            (AtomicType::Bool, SmtSort::Bool),
        ] {
            let v = Variable::array("a", atomic);
            let sort = sort_of_type(&v.ty);
            assert_eq!(sort.element(), Some(&element));
            assert!(!sort.is_arithmetic());
        }
    }

    #[test]
    fn display_is_smtlib() {
        assert_eq!(SmtSort::array(SmtSort::Real).to_string(), "(Array Int Real)");
        assert_eq!(SmtSort::Bool.to_string(), "Bool");
    }
}
