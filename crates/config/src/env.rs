use std::collections::HashMap;
use std::env;

/// A read-only source of environment variables.
pub trait EnvSource {
    /// Looks up the value of `name`, returning `None` if it's unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    #[inline]
    fn var(&self, name: &str) -> Option<String> {
        // Non-unicode values are treated as unset.
        env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    #[inline]
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    #[inline]
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}
