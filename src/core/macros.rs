//! Macros for declaring status enums.

/// Declare an enum and implement [`State`](crate::core::State) for it.
///
/// Each variant may carry a label returned by `name()`; without one the
/// variant identifier is used. `Clone`, `PartialEq`, `Debug` and the serde
/// derives are added ahead of any attributes you write, so serde container
/// attributes and extra derives can follow.
///
/// # Example
///
/// ```
/// use hearth::core::State;
/// use hearth::state_enum;
///
/// state_enum! {
///     #[derive(Copy, Eq)]
///     #[serde(rename_all = "snake_case")]
///     pub enum Door {
///         Closed => "closed",
///         Open => "open",
///         Jammed,
///     }
///     final: [Jammed]
///     error: [Jammed]
/// }
///
/// assert_eq!(Door::Open.name(), "open");
/// assert_eq!(Door::Jammed.name(), "Jammed");
/// assert!(Door::Jammed.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (@label $variant:ident $label:literal) => {
        $label
    };
    (@label $variant:ident) => {
        stringify!($variant)
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(=> $label:literal)?
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $crate::state_enum!(@label $variant $($label)?)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }

            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;

    state_enum! {
        enum Relay {
            Idle,
            Closing => "closing",
            Closed => "closed",
            Welded => "welded",
        }
        final: [Closed, Welded]
        error: [Welded]
    }

    #[test]
    fn labels_and_defaults() {
        assert_eq!(Relay::Idle.name(), "Idle");
        assert_eq!(Relay::Closing.name(), "closing");
        assert!(!Relay::Closing.is_final());
        assert!(Relay::Closed.is_final());
        assert!(!Relay::Closed.is_error());
        assert!(Relay::Welded.is_final());
        assert!(Relay::Welded.is_error());
    }

    #[test]
    fn works_without_final_or_error() {
        state_enum! {
            pub enum Blink {
                On,
                Off,
            }
        }

        assert!(!Blink::On.is_final());
        assert!(!Blink::Off.is_error());
    }

    #[test]
    fn extra_attributes_follow_the_derive() {
        state_enum! {
            #[derive(Copy, Eq, Hash)]
            #[serde(rename_all = "snake_case")]
            enum Phase {
                WarmUp,
                Steady,
            }
        }

        let json = serde_json::to_string(&Phase::WarmUp).unwrap();
        assert_eq!(json, "\"warm_up\"");
        let copy = Phase::Steady;
        let _also = copy;
        assert_eq!(copy, Phase::Steady);
    }
}
