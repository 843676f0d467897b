use std::fmt;

/// Request the camera configuration
pub const INFO: &str = "info";
/// Request the current apriltag detections
pub const FIND_APRILTAGS: &str = "fa";
/// Select the active color profile; the sensor sends no reply
pub const SWITCH_COLOR: &str = "sc";

/// A sensor command line: `name -param=value -param2=value2`.
///
/// Parameter values must not contain spaces or `=`; the sensor splits on both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self { text: name.into() }
    }

    pub fn arg(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.text.push_str(&format!(" -{}={}", name, value));
        self
    }

    /// A parameter without a value, which the sensor reads as `true`
    pub fn flag(mut self, name: &str) -> Self {
        self.text.push_str(&format!(" -{}", name));
        self
    }

    pub fn switch_color(index: usize) -> Self {
        Self::new(SWITCH_COLOR).arg("new_color", index)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
