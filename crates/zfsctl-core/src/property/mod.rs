//! Property reads and verified writes.
//!
//! Properties are never cached. A write is only reported as successful once
//! a fresh read returns the requested value, because the tool may accept an
//! assignment with a zero exit status and still normalise or ignore it.

use tracing::debug;
use zfsctl_runner::CommandRunner;

use crate::error::ZfsError;
use crate::manager::ZfsManager;
use crate::name;
use crate::parse;

/// Tracing target for property operations.
const PROPERTY_TARGET: &str = "zfsctl_core::property";

impl<R: CommandRunner> ZfsManager<R> {
    /// Reads the value of `key` on `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::Backend`] when the query fails (for example an
    /// unknown property or dataset) and [`ZfsError::MultivaluedProperty`]
    /// when the query returns more than one line.
    pub fn get_property(&self, name: &str, key: &str) -> Result<String, ZfsError> {
        name::validate_name(name)?;
        validate_key(key)?;
        let stdout = self.execute("get_property", &self.commands().get(key, name))?;
        parse::single_value(&stdout).map_err(|lines| ZfsError::MultivaluedProperty {
            dataset: name.to_owned(),
            key: key.to_owned(),
            lines,
        })
    }

    /// Sets `key` to `value` on `name` and confirms the write by reading it
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::Backend`] when either command fails and
    /// [`ZfsError::PropertyNotApplied`] when the stored value differs from
    /// `value`.
    pub fn set_property(&self, name: &str, key: &str, value: &str) -> Result<(), ZfsError> {
        name::validate_name(name)?;
        validate_key(key)?;
        self.execute("set_property", &self.commands().set(key, value, name))?;

        let actual = self.get_property(name, key)?;
        if actual != value {
            debug!(
                target: PROPERTY_TARGET,
                dataset = name,
                key,
                expected = value,
                actual = %actual,
                "property write did not stick"
            );
            return Err(ZfsError::PropertyNotApplied {
                dataset: name.to_owned(),
                key: key.to_owned(),
                expected: value.to_owned(),
                actual,
            });
        }
        Ok(())
    }
}

/// Rejects keys that would make `key=value` ambiguous.
fn validate_key(key: &str) -> Result<(), ZfsError> {
    let reason = if key.is_empty() {
        "property key must not be empty"
    } else if key.contains('=') {
        "property key must not contain '='"
    } else {
        return Ok(());
    };
    Err(ZfsError::InvalidName {
        name: key.to_owned(),
        reason,
    })
}
