use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingError {
    #[error("Setting not found")]
    NotFound(String),

    #[error("Setting already exists")]
    AlreadyExists(String),
}
