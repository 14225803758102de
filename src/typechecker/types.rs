use std::fmt;

/// Every type an expression can carry.
///
/// Scalars are their own base type; the three vector families take their base type
/// from the scalar in their name. `Unknown` marks a node whose type could not be
/// determined and suppresses further diagnostics about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    Int,
    Bool,
    Float,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    BVec2,
    BVec3,
    BVec4,
    #[default]
    Unknown,
}

impl Type {
    pub const ALL: [Type; 12] = [
        Type::Int,
        Type::Bool,
        Type::Float,
        Type::Vec2,
        Type::Vec3,
        Type::Vec4,
        Type::IVec2,
        Type::IVec3,
        Type::IVec4,
        Type::BVec2,
        Type::BVec3,
        Type::BVec4,
    ];

    /// Look up a type keyword as written in source.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Type::ALL.iter().copied().find(|ty| ty.keyword() == word)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Bool => "bool",
            Type::Float => "float",
            Type::Vec2 => "vec2",
            Type::Vec3 => "vec3",
            Type::Vec4 => "vec4",
            Type::IVec2 => "ivec2",
            Type::IVec3 => "ivec3",
            Type::IVec4 => "ivec4",
            Type::BVec2 => "bvec2",
            Type::BVec3 => "bvec3",
            Type::BVec4 => "bvec4",
            Type::Unknown => "unknown",
        }
    }

    /// The scalar component type of this type's family.
    pub fn base(self) -> Type {
        match self {
            Type::Vec2 | Type::Vec3 | Type::Vec4 => Type::Float,
            Type::IVec2 | Type::IVec3 | Type::IVec4 => Type::Int,
            Type::BVec2 | Type::BVec3 | Type::BVec4 => Type::Bool,
            other => other,
        }
    }

    /// Number of components; scalars count as one, `Unknown` as zero.
    pub fn dimension(self) -> usize {
        match self {
            Type::Int | Type::Bool | Type::Float => 1,
            Type::Vec2 | Type::IVec2 | Type::BVec2 => 2,
            Type::Vec3 | Type::IVec3 | Type::BVec3 => 3,
            Type::Vec4 | Type::IVec4 | Type::BVec4 => 4,
            Type::Unknown => 0,
        }
    }

    pub fn is_vector(self) -> bool {
        self.dimension() > 1
    }

    pub fn is_scalar(self) -> bool {
        self.dimension() == 1
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self.base(), Type::Int | Type::Float)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::Type;

    #[test]
    fn base_type_follows_family() {
        assert_eq!(Type::Vec3.base(), Type::Float);
        assert_eq!(Type::IVec2.base(), Type::Int);
        assert_eq!(Type::BVec4.base(), Type::Bool);
        assert_eq!(Type::Float.base(), Type::Float);
        assert_eq!(Type::Unknown.base(), Type::Unknown);
    }

    #[test]
    fn keywords_round_trip_through_lookup() {
        for ty in Type::ALL {
            assert_eq!(Type::from_keyword(ty.keyword()), Some(ty));
        }
        assert_eq!(Type::from_keyword("vec5"), None);
        assert_eq!(Type::from_keyword("unknown"), None);
    }
}
