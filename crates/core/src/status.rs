//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table, and its name matches the `name`
//! column of that table. API payloads carry the name, rows carry the id.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// All variants in seed order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by its database ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// The wire/lookup-table name of this variant.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Look up a variant by its wire name (exact match).
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $label => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Comma-separated list of accepted names, for error messages.
            pub fn accepted_names() -> String {
                [$($label),+].join(", ")
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

define_status_enum! {
    /// Project activation status.
    ProjectStatus {
        Pending = 1 => "pending",
        Active = 2 => "active",
        Disabled = 3 => "disabled",
        Completed = 4 => "completed",
    }
}

define_status_enum! {
    /// Module activation status. Only active modules appear in a flow.
    ModuleStatus {
        Pending = 1 => "pending",
        Active = 2 => "active",
        Disabled = 3 => "disabled",
    }
}

define_status_enum! {
    /// How new participants may join a project.
    SignupMode {
        Open = 1 => "open",
        WithCode = 2 => "with_code",
        Closed = 3 => "closed",
    }
}

define_status_enum! {
    /// How much identity a project stores about its participants.
    VisibilityMode {
        /// Only a generated participant code; no name or email.
        Code = 1 => "code",
        Email = 2 => "email",
        Full = 3 => "full",
    }
}

define_status_enum! {
    /// A participant's answer to a consent form.
    ConsentDecision {
        Accepted = 1 => "accepted",
        AcceptedForOther = 2 => "accepted_for_other",
        Declined = 3 => "declined",
    }
}

define_status_enum! {
    /// Per-participant progress through a single block.
    BlockStatus {
        NotStarted = 1 => "not_started",
        Started = 2 => "started",
        Completed = 3 => "completed",
    }
}

define_status_enum! {
    /// Kind of content a block holds.
    BlockKind {
        Text = 1 => "text",
        External = 2 => "external",
        Presentation = 3 => "presentation",
        Form = 4 => "form",
        File = 5 => "file",
    }
}

impl ProjectStatus {
    /// Whether participants may look at the project at all.
    pub fn is_visible_to_participants(self) -> bool {
        matches!(self, ProjectStatus::Active | ProjectStatus::Completed)
    }
}
