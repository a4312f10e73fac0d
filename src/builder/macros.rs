//! Macros for declaring behavior kinds.

/// Declare an enum of behavior kinds usable wherever a
/// [`BehaviorKind`](crate::core::BehaviorKind) is expected.
///
/// # Example
///
/// ```
/// use posture::behavior_kinds;
/// use posture::core::BehaviorKind;
///
/// behavior_kinds! {
///     pub enum GuardKind {
///         Patrol,
///         Attack,
///         Flee,
///     }
/// }
///
/// assert_eq!(GuardKind::Attack.as_str(), "Attack");
/// assert_eq!(BehaviorKind::from(GuardKind::Flee), BehaviorKind::new("Flee"));
/// ```
#[macro_export]
macro_rules! behavior_kinds {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl From<$name> for $crate::core::BehaviorKind {
            fn from(kind: $name) -> Self {
                $crate::core::BehaviorKind::new(kind.as_str())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{BehaviorBinding, BehaviorKind, EntityId, Toggle};

    behavior_kinds! {
        enum TestKind {
            Move,
            Attack,
        }
    }

    #[test]
    fn behavior_kinds_macro_generates_names() {
        assert_eq!(TestKind::Move.as_str(), "Move");
        assert_eq!(TestKind::ALL, &[TestKind::Move, TestKind::Attack]);
    }

    #[test]
    fn generated_kinds_convert_into_tags() {
        let binding = BehaviorBinding::new(EntityId(1), TestKind::Attack, Toggle::shared(false));
        assert_eq!(binding.kind, BehaviorKind::new("Attack"));
    }

    #[test]
    fn behavior_kinds_supports_visibility() {
        behavior_kinds! {
            pub enum PublicKind {
                Look,
            }
        }

        assert_eq!(BehaviorKind::from(PublicKind::Look).as_str(), "Look");
    }
}
