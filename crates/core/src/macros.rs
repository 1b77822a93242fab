// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`display_label!`] — stable string label + `Display` for closed
//!   unit-variant enums (port directions, port statuses)
//! - [`setters!`] — chainable setter methods for config structs

/// Give a closed unit-variant enum a stable lower-case label.
///
/// Generates an inherent `label()` returning `&'static str` and a `Display`
/// impl delegating to it. The labels are the ones that appear in logs,
/// rendered goals, and wire payloads, so they must never change casually.
///
/// ```ignore
/// crate::display_label! {
///     PortStatus {
///         Enabled => "enabled",
///         Disabled => "disabled",
///     }
/// }
/// ```
#[macro_export]
macro_rules! display_label {
    ($enum:ty { $( $variant:ident => $label:expr ),+ $(,)? }) => {
        impl $enum {
            /// Stable lower-case label for logs and rendered output.
            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

/// Generate chainable setters inside an existing `impl` block.
///
/// Field groups:
/// - `value { field: Type }` — setter assigns the value as given
/// - `optional { field: Type }` — field is `Option<Type>`, setter wraps in
///   `Some`
///
/// ```ignore
/// impl PlannerConfig {
///     ens_core::setters! {
///         value { poll_interval_ms: u64 }
///         optional { deadline_ms: u64 }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(value {
            $( $field:ident : $ty:ty ),* $(,)?
        })?
        $(optional {
            $( $opt_field:ident : $opt_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            pub fn $field(mut self, v: $ty) -> Self {
                self.$field = v;
                self
            }
        )*)?

        $($(
            pub fn $opt_field(mut self, v: $opt_ty) -> Self {
                self.$opt_field = Some(v);
                self
            }
        )*)?
    };
}
