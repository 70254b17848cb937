//! Argument type tags and signatures.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::point::CustomizationPoint;

/// The identity of a single argument type.
///
/// Plain values are tagged with their `TypeId`. A customization point passed
/// as an argument is tagged as [`SelfRef<Tag>`](crate::SelfRef) of its
/// identity tag and keeps a reference to the point, which lets strategies
/// probe *through* it.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
    point: Option<&'static CustomizationPoint>,
}

impl TypeTag {
    /// Tag for a plain type.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            point: None,
        }
    }

    /// Tag for a customization point used as an argument.
    pub fn point(point: &'static CustomizationPoint) -> Self {
        let identity = point.identity();
        Self {
            id: identity.arg_id(),
            name: identity.name(),
            point: Some(point),
        }
    }

    /// Returns the `TypeId` this tag compares by.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name, or the point name for point tags.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The customization point behind this tag, if any.
    pub fn as_point(&self) -> Option<&'static CustomizationPoint> {
        self.point
    }

    /// Whether this tag denotes `T` (for points: `SelfRef<Tag>`).
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.point {
            Some(_) => write!(f, "point {}", self.name),
            None => f.write_str(self.name),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ordered argument types of a call.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    tags: Vec<TypeTag>,
}

impl Signature {
    /// Creates a signature from tags in argument order.
    pub fn new(tags: Vec<TypeTag>) -> Self {
        Self { tags }
    }

    /// Signature of a tuple type, e.g. `Signature::of::<(u32, String)>()`.
    pub fn of<A: super::FromArgs>() -> Self {
        A::signature()
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` for the empty signature.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the tags in argument order.
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Returns the tag of the first argument.
    pub fn first(&self) -> Option<&TypeTag> {
        self.tags.first()
    }

    /// Returns the tag at `index`.
    pub fn get(&self, index: usize) -> Option<&TypeTag> {
        self.tags.get(index)
    }

    /// Whether any argument has the given type id.
    pub fn contains(&self, id: TypeId) -> bool {
        self.tags.iter().any(|tag| tag.id == id)
    }

    /// Signature without its first `n` arguments.
    pub fn skip(&self, n: usize) -> Signature {
        Signature::new(self.tags.iter().skip(n).copied().collect())
    }

    /// Signature without its first argument.
    pub fn tail(&self) -> Signature {
        self.skip(1)
    }

    /// Signature with `tag` inserted in front.
    pub fn prepend(&self, tag: TypeTag) -> Signature {
        let mut tags = Vec::with_capacity(self.tags.len() + 1);
        tags.push(tag);
        tags.extend_from_slice(&self.tags);
        Signature::new(tags)
    }

    /// Signature with its first two arguments exchanged.
    ///
    /// Returns `None` for fewer than two arguments.
    pub fn swap_front(&self) -> Option<Signature> {
        if self.tags.len() < 2 {
            return None;
        }
        let mut tags = self.tags.clone();
        tags.swap(0, 1);
        Some(Signature::new(tags))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tag}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_names() {
        let a = Signature::of::<(u32, String)>();
        let b = Signature::new(vec![TypeTag::of::<u32>(), TypeTag::of::<String>()]);
        assert_eq!(a, b);
        assert_ne!(a, Signature::of::<(String, u32)>());
    }

    #[test]
    fn test_skip_and_prepend() {
        let sig = Signature::of::<(u8, u16, u32)>();
        assert_eq!(sig.tail(), Signature::of::<(u16, u32)>());
        assert_eq!(sig.skip(3), Signature::default());
        assert_eq!(sig.skip(7), Signature::default());
        assert_eq!(sig.tail().prepend(TypeTag::of::<u8>()), sig);
    }

    #[test]
    fn test_swap_front() {
        let sig = Signature::of::<(u8, u16, u32)>();
        assert_eq!(sig.swap_front(), Some(Signature::of::<(u16, u8, u32)>()));
        assert!(Signature::of::<(u8,)>().swap_front().is_none());
    }

    #[test]
    fn test_contains() {
        let sig = Signature::of::<(u8, String)>();
        assert!(sig.contains(TypeId::of::<String>()));
        assert!(!sig.contains(TypeId::of::<u16>()));
    }

    #[test]
    fn test_display() {
        let sig = Signature::of::<(u8, bool)>();
        assert_eq!(sig.to_string(), "(u8, bool)");
        assert_eq!(Signature::default().to_string(), "()");
    }
}
