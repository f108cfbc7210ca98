use std::fmt;

/// Element types an array may hold. Arrays never nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    Int,
    Float,
    Bool,
}

impl From<AtomicType> for Type {
    fn from(atomic: AtomicType) -> Self {
        match atomic {
            AtomicType::Int => Type::Int,
            AtomicType::Float => Type::Float,
            AtomicType::Bool => Type::Bool,
        }
    }
}

/// Array type: integer-indexed, with the name of the companion length
/// variable that tracks the array's length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub element: AtomicType,
    pub length: String,
}

/// Program-logic type of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    Array(ArrayType),
}

impl Type {
    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicType::Int => write!(f, "int"),
            AtomicType::Float => write!(f, "float"),
            AtomicType::Bool => write!(f, "bool"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Array(at) => write!(f, "{}[]", at.element),
        }
    }
}

/// A declared variable.
///
/// Names are global for a verification session: two variables with the same
/// name denote the same solver constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Type::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, Type::Float)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, Type::Bool)
    }

    /// Create an array variable together with its companion length variable.
    pub fn array(name: impl Into<String>, element: AtomicType) -> Self {
        let name = name.into();
        let length = length_variable_name(&name);
        Self {
            name,
            ty: Type::Array(ArrayType { element, length }),
        }
    }

    /// The companion length variable of an array, `None` for scalars.
    pub fn length_variable(&self) -> Option<Variable> {
        match &self.ty {
            Type::Array(at) => Some(Variable::int(at.length.clone())),
            _ => None,
        }
    }
}

/// Naming convention for the companion length variable of array `name`.
///
/// The `.` keeps it apart from any identifier a source program can declare.
pub fn length_variable_name(name: &str) -> String {
    format!("{name}.length")
}
