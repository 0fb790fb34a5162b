//! Commands exposed to the frontend
//!
//! This module organizes commands into logical submodules:
//! - `contacts`: Contact CRUD, trash lifecycle and mail handoff
//! - `folders`: Folder operations
//! - `drafting`: Card extraction, drafting and refinement
//! - `sharing`: Public share links
//! - `settings`: Application settings, signature and API key
//!
//! `invoke` dispatches a command by name with JSON arguments, the way a
//! frontend shell calls into the engine. Argument keys are camelCase.

pub mod contacts;
pub mod drafting;
pub mod folders;
pub mod settings;
pub mod sharing;

use crate::app::AppState;
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub use contacts::*;
pub use drafting::*;
pub use folders::*;
pub use settings::*;
pub use sharing::*;

// ===== General Commands =====

/// Get application information
pub async fn get_app_info(state: &AppState) -> Result<AppInfo> {
    Ok(AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_data_dir: state.app_data_dir.to_string_lossy().to_string(),
    })
}

/// Application information structure
#[derive(serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub app_data_dir: String,
}

/// Names accepted by `invoke`
pub const COMMANDS: &[&str] = &[
    "get_app_info",
    "save_contact",
    "get_contact",
    "list_contacts",
    "update_contact",
    "move_contact",
    "delete_contact",
    "restore_contact",
    "permanent_delete_contact",
    "cleanup_trash",
    "get_contact_image",
    "folder_counts",
    "send_contact",
    "list_folders",
    "create_folder",
    "delete_folder",
    "extract_contact",
    "generate_draft",
    "refine_draft",
    "apply_voice_event",
    "share_contact",
    "get_shared_item",
    "get_settings",
    "update_ai_settings",
    "update_share_settings",
    "update_drafting_settings",
    "get_signature",
    "save_signature",
    "set_api_key",
    "delete_api_key",
    "has_api_key",
];

/// Command arguments: a JSON object keyed by camelCase names
struct Args(Map<String, Value>);

impl Args {
    fn parse(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self(Map::new())),
            other => Err(AppError::InvalidInput(format!(
                "Command arguments must be a JSON object, got: {}",
                other
            ))),
        }
    }

    fn required<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .0
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::InvalidInput(format!("Missing argument: {}", key)))?;
        decode_arg(key, value)
    }

    fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode_arg(key, value.clone()).map(Some),
        }
    }
}

fn decode_arg<T: DeserializeOwned>(key: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::InvalidInput(format!("Invalid argument {}: {}", key, e)))
}

fn json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Run a command by name
pub async fn invoke(state: &AppState, command: &str, args: Value) -> Result<Value> {
    tracing::debug!("Invoking command: {}", command);
    let a = Args::parse(args)?;

    match command {
        "get_app_info" => json(get_app_info(state).await?),

        // Contacts
        "save_contact" => json(save_contact(state, a.required("userId")?, a.required("contact")?).await?),
        "get_contact" => json(get_contact(state, a.required("userId")?, a.required("id")?).await?),
        "list_contacts" => {
            json(list_contacts(state, a.required("userId")?, a.optional("folderId")?).await?)
        }
        "update_contact" => json(
            update_contact(state, a.required("userId")?, a.required("id")?, a.required("update")?)
                .await?,
        ),
        "move_contact" => json(
            move_contact(state, a.required("userId")?, a.required("id")?, a.required("folderId")?)
                .await?,
        ),
        "delete_contact" => {
            json(delete_contact(state, a.required("userId")?, a.required("id")?).await?)
        }
        "restore_contact" => {
            json(restore_contact(state, a.required("userId")?, a.required("id")?).await?)
        }
        "permanent_delete_contact" => {
            json(permanent_delete_contact(state, a.required("userId")?, a.required("id")?).await?)
        }
        "cleanup_trash" => json(cleanup_trash(state, a.required("userId")?).await?),
        "get_contact_image" => {
            json(get_contact_image(state, a.required("userId")?, a.required("id")?).await?)
        }
        "folder_counts" => json(folder_counts(state, a.required("userId")?).await?),
        "send_contact" => json(send_contact(state, a.required("userId")?, a.required("id")?).await?),

        // Folders
        "list_folders" => json(list_folders(state, a.required("userId")?).await?),
        "create_folder" => {
            json(create_folder(state, a.required("userId")?, a.required("name")?).await?)
        }
        "delete_folder" => {
            json(delete_folder(state, a.required("userId")?, a.required("folderId")?).await?)
        }

        // Drafting
        "extract_contact" => json(
            extract_contact(state, a.optional("image")?.unwrap_or(Value::Null)).await?,
        ),
        "generate_draft" => {
            json(generate_draft(state, a.required("userId")?, a.required("request")?).await?)
        }
        "refine_draft" => json(
            refine_draft(state, a.required("currentBody")?, a.required("instruction")?).await?,
        ),
        "apply_voice_event" => json(
            apply_voice_event(state, a.required("currentBody")?, a.required("event")?).await?,
        ),

        // Sharing
        "share_contact" => json(
            share_contact(state, a.required("userId")?, a.required("id")?, a.optional("ttlDays")?)
                .await?,
        ),
        "get_shared_item" => json(get_shared_item(state, a.required("id")?).await?),

        // Settings
        "get_settings" => json(get_settings(state).await?),
        "update_ai_settings" => json(update_ai_settings(state, a.required("ai")?).await?),
        "update_share_settings" => json(update_share_settings(state, a.required("share")?).await?),
        "update_drafting_settings" => {
            json(update_drafting_settings(state, a.required("drafting")?).await?)
        }
        "get_signature" => json(get_signature(state, a.required("userId")?).await?),
        "save_signature" => {
            json(save_signature(state, a.required("userId")?, a.required("signature")?).await?)
        }
        "set_api_key" => json(set_api_key(a.required("key")?).await?),
        "delete_api_key" => json(delete_api_key().await?),
        "has_api_key" => json(has_api_key().await?),

        other => Err(AppError::InvalidInput(format!("Unknown command: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_required_and_optional() {
        let args = Args::parse(serde_json::json!({"userId": "u1", "folderId": null})).unwrap();

        assert_eq!(args.required::<String>("userId").unwrap(), "u1");
        assert_eq!(args.optional::<String>("folderId").unwrap(), None);
        assert!(matches!(
            args.required::<String>("id"),
            Err(AppError::InvalidInput(msg)) if msg.contains("Missing argument: id")
        ));
        assert!(matches!(
            args.required::<u32>("userId"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_args_must_be_object() {
        assert!(Args::parse(Value::Null).is_ok());
        assert!(matches!(
            Args::parse(serde_json::json!([1, 2])),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_command_names_unique() {
        let mut names = COMMANDS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
