//! Configuration access port trait.

/// Read access to sectioned key/value settings. Values are returned raw;
/// parsing and range checks live in the domain.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
