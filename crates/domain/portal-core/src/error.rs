/// Invalid animation catalogue data. Fatal when raised while seeding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("animation id must not be empty")]
    EmptyId,
    #[error("animation '{id}' must have a positive weight")]
    InvalidWeight { id: String },
    #[error("animation '{id}' must have a positive duration")]
    InvalidDuration { id: String },
    #[error("animation '{id}' is defined more than once")]
    DuplicateId { id: String },
    #[error("theme '{theme}' must have a positive weight")]
    InvalidThemeWeight { theme: String },
}
