//! Command definitions and their on-disk manifest form.
//!
//! A manifest is a TOML document describing one slash command:
//!
//! ```toml
//! name = "roll"
//! description = "Roll a dice"
//! handler = "roll"
//!
//! [[options]]
//! name = "sides"
//! description = "Number of sides on the die (2-1000)"
//! kind = "integer"
//! min_value = 2
//! max_value = 1000
//! ```

use crate::{CommandHandler, HandlerCatalog};
use derive_getters::Getters;
use herald_error::{CommandLoadError, CommandLoadErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

const MAX_DESCRIPTION_LEN: usize = 100;
const MAX_OPTIONS: usize = 25;

static NAME_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[-_\p{L}\p{N}]{1,32}$").expect("static pattern is valid")
});

/// Value type of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Free text
    String,
    /// Whole number
    Integer,
    /// True/false
    Boolean,
    /// A user
    User,
    /// A channel
    Channel,
    /// A role
    Role,
    /// A user or role
    Mentionable,
    /// Floating point number
    Number,
    /// File upload
    Attachment,
}

impl OptionKind {
    /// Platform option type code.
    pub fn code(self) -> u8 {
        match self {
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
            Self::User => 6,
            Self::Channel => 7,
            Self::Role => 8,
            Self::Mentionable => 9,
            Self::Number => 10,
            Self::Attachment => 11,
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }
}

/// One option of a command as written in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CommandOption {
    /// Option name
    name: String,
    /// Option description
    description: String,
    /// Value type
    kind: OptionKind,
    /// Whether the option must be supplied
    #[serde(default)]
    required: bool,
    /// Lower bound for numeric options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_value: Option<f64>,
    /// Upper bound for numeric options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_value: Option<f64>,
    /// Maximum length for string options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<u16>,
}

/// Manifest file contents before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandManifest {
    /// Command name
    #[serde(default)]
    pub name: Option<String>,
    /// Command description
    #[serde(default)]
    pub description: Option<String>,
    /// Name of the compiled handler
    #[serde(default)]
    pub handler: Option<String>,
    /// Options, in order
    #[serde(default)]
    pub options: Vec<CommandOption>,
    /// Default member permission bitmask required to see the command
    #[serde(default)]
    pub default_member_permissions: Option<String>,
}

impl CommandManifest {
    /// Parse a manifest document.
    pub fn parse(content: &str) -> Result<Self, CommandLoadError> {
        toml::from_str(content)
            .map_err(|e| CommandLoadError::new(CommandLoadErrorKind::Parse(e.to_string())))
    }
}

/// A validated command: name, description, option schema and handler.
#[derive(Clone, Getters)]
pub struct CommandDefinition {
    /// Unique, case-sensitive name
    name: String,
    /// Shown in the platform's command picker
    description: String,
    /// Option schema
    options: Vec<CommandOption>,
    /// Permission bitmask members need by default
    default_member_permissions: Option<String>,
    /// Name the handler was looked up by
    handler_name: String,
    /// Handler invoked by the dispatcher
    #[getter(skip)]
    handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    /// Build a definition directly, validating it like a manifest would be.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler_name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Self, CommandLoadError> {
        let definition = Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            default_member_permissions: None,
            handler_name: handler_name.into(),
            handler,
        };
        validate_text("name", &definition.name)?;
        validate_description("description", &definition.description)?;
        Ok(definition)
    }

    /// Validate a manifest and resolve its handler against `catalog`.
    pub fn from_manifest(
        manifest: CommandManifest,
        catalog: &HandlerCatalog,
    ) -> Result<Self, CommandLoadError> {
        let name = required(manifest.name, "name")?;
        validate_text("name", &name)?;
        let description = required(manifest.description, "description")?;
        validate_description("description", &description)?;
        let handler_name = required(manifest.handler, "handler")?;
        let handler = catalog.get(&handler_name).ok_or_else(|| {
            CommandLoadError::new(CommandLoadErrorKind::UnknownHandler(handler_name.clone()))
        })?;
        validate_options(&manifest.options)?;
        if let Some(mask) = &manifest.default_member_permissions {
            mask.parse::<u64>().map_err(|_| {
                CommandLoadError::invalid_field(
                    "default_member_permissions",
                    "must be a decimal bitmask",
                )
            })?;
        }

        Ok(Self {
            name,
            description,
            options: manifest.options,
            default_member_permissions: manifest.default_member_permissions,
            handler_name,
            handler,
        })
    }

    /// Handler invoked for this command.
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// Serialize into the platform's application-command shape.
    pub fn to_payload(&self) -> CommandPayload {
        CommandPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: 1,
            options: self
                .options
                .iter()
                .map(|option| OptionPayload {
                    kind: option.kind.code(),
                    name: option.name.clone(),
                    description: option.description.clone(),
                    required: option.required,
                    min_value: option.min_value,
                    max_value: option.max_value,
                    max_length: option.max_length,
                })
                .collect(),
            default_member_permissions: self.default_member_permissions.clone(),
        }
    }
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("handler_name", &self.handler_name)
            .finish()
    }
}

/// Application command as submitted for registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    /// Command name
    pub name: String,
    /// Command description
    pub description: String,
    /// Command type; 1 is a chat input (slash) command
    #[serde(rename = "type")]
    pub kind: u8,
    /// Options
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionPayload>,
    /// Default member permissions bitmask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
}

/// Application command option as submitted for registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPayload {
    /// Option type code
    #[serde(rename = "type")]
    pub kind: u8,
    /// Option name
    pub name: String,
    /// Option description
    pub description: String,
    /// Whether the option is required
    pub required: bool,
    /// Numeric lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Numeric upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// String length limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
}

fn required(value: Option<String>, field: &str) -> Result<String, CommandLoadError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CommandLoadError::invalid_field(field, "missing"))
}

fn validate_text(field: &str, value: &str) -> Result<(), CommandLoadError> {
    if !NAME_PATTERN.is_match(value) {
        return Err(CommandLoadError::invalid_field(
            field,
            format!("'{value}' must be 1-32 letters, digits, '-' or '_'"),
        ));
    }
    if value.to_lowercase() != value {
        return Err(CommandLoadError::invalid_field(
            field,
            format!("'{value}' must be lowercase"),
        ));
    }
    Ok(())
}

fn validate_description(field: &str, value: &str) -> Result<(), CommandLoadError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LEN {
        return Err(CommandLoadError::invalid_field(
            field,
            format!("must be 1-{MAX_DESCRIPTION_LEN} characters, got {len}"),
        ));
    }
    Ok(())
}

fn validate_options(options: &[CommandOption]) -> Result<(), CommandLoadError> {
    if options.len() > MAX_OPTIONS {
        return Err(CommandLoadError::invalid_field(
            "options",
            format!("at most {MAX_OPTIONS} options are allowed"),
        ));
    }

    let mut seen_optional = false;
    for (index, option) in options.iter().enumerate() {
        let field = format!("options[{index}]");
        validate_text(&format!("{field}.name"), &option.name)?;
        validate_description(&format!("{field}.description"), &option.description)?;

        if options[..index].iter().any(|o| o.name == option.name) {
            return Err(CommandLoadError::invalid_field(
                field,
                format!("duplicate option '{}'", option.name),
            ));
        }
        // Required options must come before optional ones.
        if option.required && seen_optional {
            return Err(CommandLoadError::invalid_field(
                field,
                "required options must precede optional ones",
            ));
        }
        seen_optional |= !option.required;

        let has_bounds = option.min_value.is_some() || option.max_value.is_some();
        if has_bounds && !option.kind.is_numeric() {
            return Err(CommandLoadError::invalid_field(
                field,
                "min_value/max_value only apply to integer and number options",
            ));
        }
        if let (Some(min), Some(max)) = (option.min_value, option.max_value) {
            if min > max {
                return Err(CommandLoadError::invalid_field(field, "min_value exceeds max_value"));
            }
        }
        if option.max_length.is_some() && option.kind != OptionKind::String {
            return Err(CommandLoadError::invalid_field(
                field,
                "max_length only applies to string options",
            ));
        }
    }
    Ok(())
}
