//! Mocked process environments.

use mockable::MockEnv;
use std::env::VarError;

fn lookup(vars: &[(&str, &str)], key: &str) -> Result<String, VarError> {
    vars.iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| (*value).to_owned())
        .ok_or(VarError::NotPresent)
}

/// A `MockEnv` exposing exactly `vars`; every other lookup fails with
/// [`VarError::NotPresent`].
pub fn mock_env(vars: &[(&'static str, &'static str)]) -> MockEnv {
    let owned: Vec<(&'static str, &'static str)> = vars.to_vec();
    let mut env = MockEnv::new();
    env.expect_raw().returning(move |key| lookup(&owned, key));
    env
}

/// A `MockEnv` with no variables set.
pub fn empty_env() -> MockEnv {
    mock_env(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::Env;

    #[test]
    fn mock_env_serves_listed_variables_only() {
        let env = mock_env(&[("HOME", "/home/dev")]);
        assert_eq!(env.raw("HOME").as_deref(), Ok("/home/dev"));
        assert_eq!(env.raw("PATH"), Err(VarError::NotPresent));
    }
}
